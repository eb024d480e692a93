//! Enumeration types used throughout the simulation.

use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Image groups of the sprite sheet. The discriminant is the 4-bit group
/// number sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ImageSet {
    MiniShot = 0,
    Bomb0 = 1,
    Explosion = 2,
    Bomb1 = 3,
    Missile = 4,
    Bomb2 = 5,
    Player0 = 6,
    Bomb3 = 7,
    Arch0 = 8,
    Misc0 = 9,
    Arch1 = 10,
    Misc1 = 11,
    Arch2 = 12,
    /// Fortress core and miscellaneous tiles.
    Fort0 = 13,
    /// Fortress pieces without a west link.
    Fort1 = 14,
    /// Fortress pieces with a west link.
    Fort2 = 15,
}

impl ImageSet {
    /// Enemy ship appearances, picked at random on spawn.
    pub const ENEMIES: [ImageSet; 7] = [
        ImageSet::Bomb0,
        ImageSet::Bomb1,
        ImageSet::Bomb2,
        ImageSet::Bomb3,
        ImageSet::Arch0,
        ImageSet::Arch1,
        ImageSet::Arch2,
    ];

    pub fn group(self) -> u8 {
        self as u8
    }
}

/// Bitset gating which actors may collide.
///
/// A source actor tests a target only when
/// `source.source_mask & target.target_mask` is non-empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    pub const NONE: CollisionMask = CollisionMask(0);
    pub const ENEMY_NPC: CollisionMask = CollisionMask(1 << 0);
    pub const ENEMY_BASE: CollisionMask = CollisionMask(1 << 1);
    pub const PLAYER1: CollisionMask = CollisionMask(1 << 29);
    pub const PLAYER2: CollisionMask = CollisionMask(1 << 30);
    pub const ENEMY: CollisionMask = CollisionMask(Self::ENEMY_NPC.0 | Self::ENEMY_BASE.0);
    pub const PLAYER: CollisionMask = CollisionMask(Self::PLAYER1.0 | Self::PLAYER2.0);

    /// Target mask for the ship in `slot`.
    pub fn player(slot: usize) -> CollisionMask {
        match slot {
            0 => Self::PLAYER1,
            _ => Self::PLAYER2,
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, other: CollisionMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for CollisionMask {
    type Output = CollisionMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        CollisionMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for CollisionMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CollisionMask {
    type Output = CollisionMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        CollisionMask(self.0 & rhs.0)
    }
}

/// Controller buttons, in wire bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    Start = 2,
    Select = 3,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::A, Button::B, Button::Start, Button::Select];

    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Button state for the current tick. Bit 0 = down, bit 1 = changed this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ButtonState {
    #[default]
    Up = 0,
    Down = 1,
    Released = 2,
    Pressed = 3,
}

impl ButtonState {
    pub fn is_down(self) -> bool {
        (self as u8) & 1 != 0
    }

    pub fn changed(self) -> bool {
        (self as u8) & 2 != 0
    }
}

/// Per-player statistic carried by `SetPlayerStat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatKind {
    Score = 0,
    Lives = 1,
}

impl StatKind {
    pub fn from_nibble(nibble: u8) -> Option<StatKind> {
        match nibble {
            0 => Some(StatKind::Score),
            1 => Some(StatKind::Lives),
            _ => None,
        }
    }
}

/// Round state of the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Fortresses remain on the current level.
    #[default]
    Playing,
    /// All fortresses fell; the next level loads when the delay runs out.
    LevelCleared,
    /// Every active player is out of lives.
    GameOver,
}

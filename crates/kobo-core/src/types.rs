//! Value types for world geometry.
//!
//! Positions are `I16Vec2` in pixels on a toroidal playfield whose side
//! lengths are powers of two, so wrapping is a single mask operation.

use glam::{I16Vec2, IVec2};
use serde::{Deserialize, Serialize};

/// Position on the playfield, in pixels.
pub type WorldPos = I16Vec2;

/// Axis-aligned rectangle. `right()` and `bottom()` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub origin: I16Vec2,
    pub size: I16Vec2,
}

impl Rect {
    pub const fn new(x: i16, y: i16, width: i16, height: i16) -> Self {
        Self {
            origin: I16Vec2::new(x, y),
            size: I16Vec2::new(width, height),
        }
    }

    pub fn from_origin_size(origin: I16Vec2, size: I16Vec2) -> Self {
        Self { origin, size }
    }

    pub fn left(&self) -> i32 {
        self.origin.x as i32
    }

    pub fn top(&self) -> i32 {
        self.origin.y as i32
    }

    pub fn right(&self) -> i32 {
        self.origin.x as i32 + self.size.x as i32
    }

    pub fn bottom(&self) -> i32 {
        self.origin.y as i32 + self.size.y as i32
    }

    pub fn width(&self) -> i32 {
        self.size.x as i32
    }

    pub fn height(&self) -> i32 {
        self.size.y as i32
    }

    /// A rectangle with a non-positive extent on either axis is empty.
    pub fn is_valid(&self) -> bool {
        self.size.x > 0 && self.size.y > 0
    }

    /// Centre point, rounded towards the origin.
    pub fn center(&self) -> I16Vec2 {
        self.origin + self.size / 2
    }

    pub fn contains(&self, point: I16Vec2) -> bool {
        let (x, y) = (point.x as i32, point.y as i32);
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }

    /// Plain (non-wrapping) overlap test.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Grow by `amount` on every side.
    pub fn inflate(&self, amount: i16) -> Rect {
        Rect {
            origin: self.origin - I16Vec2::splat(amount),
            size: self.size + I16Vec2::splat(amount * 2),
        }
    }

    pub fn translate(&self, offset: I16Vec2) -> Rect {
        Rect {
            origin: self.origin + offset,
            size: self.size,
        }
    }

    /// Overlap test on a torus of `world_size`.
    ///
    /// Intervals `[a, a + wa)` and `[b, b + wb)` meet on a circle of
    /// circumference `S` iff `(b - a) mod S < wa` or `(a - b) mod S < wb`.
    pub fn overlaps_mod(&self, other: &Rect, world_size: I16Vec2) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        let axis = |a: i32, wa: i32, b: i32, wb: i32, s: i32| {
            (b - a).rem_euclid(s) < wa || (a - b).rem_euclid(s) < wb
        };
        axis(
            self.left(),
            self.width(),
            other.left(),
            other.width(),
            world_size.x as i32,
        ) && axis(
            self.top(),
            self.height(),
            other.top(),
            other.height(),
            world_size.y as i32,
        )
    }
}

/// Toroidal playfield dimensions. Both sides must be powers of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playfield {
    size: I16Vec2,
}

impl Playfield {
    pub fn new(size: I16Vec2) -> Self {
        debug_assert!(
            size.x > 0 && (size.x as u16).is_power_of_two(),
            "playfield width {} is not a power of two",
            size.x
        );
        debug_assert!(
            size.y > 0 && (size.y as u16).is_power_of_two(),
            "playfield height {} is not a power of two",
            size.y
        );
        Self { size }
    }

    pub fn size(&self) -> I16Vec2 {
        self.size
    }

    pub fn mask(&self) -> I16Vec2 {
        self.size - I16Vec2::ONE
    }

    /// Wrap a position into `[0, size)` on both axes.
    pub fn wrap(&self, pos: I16Vec2) -> I16Vec2 {
        pos & self.mask()
    }

    /// Wrap a wide position into `[0, size)` on both axes.
    pub fn wrap_wide(&self, pos: IVec2) -> I16Vec2 {
        let mask = self.mask().as_ivec2();
        (pos & mask).as_i16vec2()
    }

    /// Offset from `from` to `to` along the shortest path around the torus.
    /// Each axis lands in `[-size/2, size/2)`.
    pub fn shortest_delta(&self, from: I16Vec2, to: I16Vec2) -> IVec2 {
        let size = self.size.as_ivec2();
        let half = size / 2;
        let raw = to.as_ivec2() - from.as_ivec2();
        let mask = size - IVec2::ONE;
        ((raw + half) & mask) - half
    }

    pub fn distance_squared(&self, a: I16Vec2, b: I16Vec2) -> i32 {
        self.shortest_delta(a, b).length_squared()
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(I16Vec2::splat(crate::constants::WORLD_SIZE))
    }
}

/// Eight compass headings plus `Stopped`.
///
/// The numeric values are part of the wire format (high nibble of the input
/// byte) and of sprite selection (movers show sub-image = direction).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
    #[default]
    Stopped = 8,
}

impl Direction {
    pub const COMPASS: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Wire value, 0..=8.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Decode a 4-bit wire value. Anything above 8 reads as `Stopped`.
    pub fn from_bits(bits: u8) -> Direction {
        match bits {
            0..=7 => Self::COMPASS[bits as usize],
            _ => Direction::Stopped,
        }
    }

    pub fn is_moving(self) -> bool {
        self != Direction::Stopped
    }

    /// Step of `speed` pixels in this direction. Diagonals move `speed` on both axes.
    pub fn to_delta(self, speed: i16) -> I16Vec2 {
        let s = speed;
        match self {
            Direction::North => I16Vec2::new(0, -s),
            Direction::NorthEast => I16Vec2::new(s, -s),
            Direction::East => I16Vec2::new(s, 0),
            Direction::SouthEast => I16Vec2::new(s, s),
            Direction::South => I16Vec2::new(0, s),
            Direction::SouthWest => I16Vec2::new(-s, s),
            Direction::West => I16Vec2::new(-s, 0),
            Direction::NorthWest => I16Vec2::new(-s, -s),
            Direction::Stopped => I16Vec2::ZERO,
        }
    }

    /// Rotate clockwise by `steps` eighths of a turn. `Stopped` stays stopped.
    pub fn rotate(self, steps: i32) -> Direction {
        match self {
            Direction::Stopped => Direction::Stopped,
            d => Self::COMPASS[((d as i32 + steps) & 7) as usize],
        }
    }

    /// Nearest compass heading for an offset. A zero offset is `Stopped`.
    pub fn from_delta(delta: IVec2) -> Direction {
        if delta == IVec2::ZERO {
            return Direction::Stopped;
        }
        let (ax, ay) = (delta.x.abs(), delta.y.abs());
        // tan(22.5deg) ~= 0.414; 2/5 keeps the sectors integer-only.
        let vertical = ax * 5 < ay * 2;
        let horizontal = ay * 5 < ax * 2;
        match (vertical, horizontal, delta.x > 0, delta.y > 0) {
            (true, _, _, false) => Direction::North,
            (true, _, _, true) => Direction::South,
            (_, true, true, _) => Direction::East,
            (_, true, false, _) => Direction::West,
            (_, _, true, false) => Direction::NorthEast,
            (_, _, true, true) => Direction::SouthEast,
            (_, _, false, true) => Direction::SouthWest,
            (_, _, false, false) => Direction::NorthWest,
        }
    }

    /// Signed number of eighth-turns from `self` to `target`, in `[-4, 3]`.
    /// Zero when either heading is `Stopped`.
    pub fn turn_towards(self, target: Direction) -> i32 {
        if !self.is_moving() || !target.is_moving() {
            return 0;
        }
        ((target as i32 - self as i32 + 4) & 7) - 4
    }

    /// Heading of the explosion left behind by a fortress node, given the
    /// mask of neighbours it was linked to (N=1, E=2, S=4, W=8).
    pub fn from_neighbour_mask(mask: u8) -> Direction {
        match mask {
            1 => Direction::North,
            2 => Direction::East,
            4 => Direction::South,
            8 => Direction::West,
            3 => Direction::NorthEast,
            6 => Direction::SouthEast,
            9 => Direction::NorthWest,
            12 => Direction::SouthWest,
            7 => Direction::East,
            11 => Direction::North,
            13 => Direction::West,
            14 => Direction::South,
            _ => Direction::Stopped,
        }
    }
}

/// Background grid cell address. The background grid is 128x128 so each
/// axis fits one byte on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub x: u8,
    pub y: u8,
}

impl CellPos {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Cell containing a (wrapped) world position.
    pub fn from_world(pos: I16Vec2) -> Self {
        let scale = crate::constants::BACKGROUND_CELL_SIZE;
        Self {
            x: (pos.x / scale) as u8,
            y: (pos.y / scale) as u8,
        }
    }
}

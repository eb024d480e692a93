//! Per-slot player bookkeeping: the ship, its camera, score and lives.

use glam::I16Vec2;
use serde::{Deserialize, Serialize};

use kobo_core::constants::CAMERA_FOLLOW_DIVISOR;
use kobo_core::types::Playfield;

use crate::arena::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Live ship, `None` while dead or waiting to respawn.
    #[serde(skip)]
    pub actor: Option<ActorId>,
    pub camera: I16Vec2,
    pub score: i32,
    pub lives: i32,
    /// Ticks until the ship comes back, counted only while `actor` is `None`.
    pub respawn_timer: u32,
    /// Slot takes part in the round. Slot 1 is only active in two-player mode.
    pub active: bool,
}

impl PlayerInfo {
    pub fn new(lives: i32, active: bool) -> Self {
        Self {
            actor: None,
            camera: I16Vec2::ZERO,
            score: 0,
            lives,
            respawn_timer: 0,
            active,
        }
    }

    /// Still in the round: has a ship, or has lives left to spend on one.
    pub fn in_play(&self) -> bool {
        self.active && (self.actor.is_some() || self.lives > 0)
    }
}

/// Move `camera` most of the way towards `target`, going round the torus the
/// short way.
pub fn follow_camera(camera: I16Vec2, target: I16Vec2, playfield: Playfield) -> I16Vec2 {
    let delta = playfield.shortest_delta(camera, target);
    let divisor = CAMERA_FOLLOW_DIVISOR as i32;
    let step = delta * (divisor - 1) / divisor;
    playfield.wrap_wide(camera.as_ivec2() + step)
}

//! Enemy steering.
//!
//! An enemy flies straight most of the time. On average once every
//! `relaxed` ticks it reconsiders its heading: towards a ship in range,
//! turning at most a quarter turn, or a random eighth-turn either way.

use glam::IVec2;
use rand::Rng;

use kobo_core::constants::{ENEMY_MAX_TURN, ENEMY_RELAXED_MIN, ENEMY_RELAXED_SPREAD};
use kobo_core::types::Direction;

/// Draw a fresh "relaxed" factor for a newly spawned enemy.
pub fn relaxed_factor<R: Rng>(rng: &mut R) -> u32 {
    rng.gen_range(0..ENEMY_RELAXED_SPREAD) + ENEMY_RELAXED_MIN
}

/// Turn needed to head along `to_player`, clamped to `ENEMY_MAX_TURN`.
pub fn pursuit_turn(current: Direction, to_player: IVec2) -> i32 {
    let wanted = Direction::from_delta(to_player);
    current
        .turn_towards(wanted)
        .clamp(-ENEMY_MAX_TURN, ENEMY_MAX_TURN)
}

/// Heading for the next tick.
///
/// `to_player` is the shortest offset to a ship within sensing range, if any.
pub fn steer<R: Rng>(
    current: Direction,
    relaxed: u32,
    to_player: Option<IVec2>,
    rng: &mut R,
) -> Direction {
    if rng.gen_range(0..relaxed.max(1)) != 0 {
        return current;
    }
    let turn = match to_player {
        Some(delta) => pursuit_turn(current, delta),
        None => {
            if rng.gen_bool(0.5) {
                1
            } else {
                -1
            }
        }
    };
    current.rotate(turn)
}

//! Fortress fire and enemy launch decisions.
//!
//! The chance that a fortress node acts on a given attempt depends only on
//! the squared distance to the nearest ship: a fixed high chance inside the
//! near radius and an inverse-square falloff beyond it. All randomness comes
//! from the caller's generator, so a seeded generator reproduces every
//! decision.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tunable spawn parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// A node attempts to act on average once per this many ticks.
    pub attempt_period_ticks: u32,
    /// The core attempts to launch an enemy on average once per this many ticks.
    pub launch_period_ticks: u32,
    /// Inside this distance (px) the near chance applies. 40 background cells.
    pub near_distance: i32,
    /// Chance to act when a ship is inside the near distance.
    pub near_chance: f64,
    /// No launches while this many enemies are alive.
    pub max_enemies: usize,
    /// Launched enemies appear up to this many pixels from the core on each axis.
    pub launch_jitter: i16,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            attempt_period_ticks: 45,
            launch_period_ticks: 180,
            near_distance: 40 * 16,
            near_chance: 0.9,
            max_enemies: 16,
            launch_jitter: 8,
        }
    }
}

impl SpawnTuning {
    pub fn near_distance_sq(&self) -> i64 {
        self.near_distance as i64 * self.near_distance as i64
    }
}

/// What a fortress node does with an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnDecision {
    Nothing,
    FireShot,
    LaunchEnemy,
}

/// Role of the node making the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitter {
    /// Launches enemies.
    Core,
    /// Exposed end of a corridor. Fires at ships.
    Leaf,
    /// Interior piece. Never acts.
    Wall,
}

/// Chance to act given the squared distance to the nearest ship.
pub fn spawn_probability(distance_sq: i64, tuning: &SpawnTuning) -> f64 {
    let near_sq = tuning.near_distance_sq();
    if distance_sq <= near_sq {
        return tuning.near_chance;
    }
    tuning.near_chance * near_sq as f64 / distance_sq as f64
}

/// Roll one tick's decision for a node.
///
/// `nearest_sq` is `None` when no ship is in play. `live_enemies` caps launches.
pub fn decide<R: Rng>(
    emitter: Emitter,
    nearest_sq: Option<i64>,
    live_enemies: usize,
    tuning: &SpawnTuning,
    rng: &mut R,
) -> SpawnDecision {
    let Some(distance_sq) = nearest_sq else {
        return SpawnDecision::Nothing;
    };
    let (period, outcome) = match emitter {
        Emitter::Wall => return SpawnDecision::Nothing,
        Emitter::Leaf => (tuning.attempt_period_ticks, SpawnDecision::FireShot),
        Emitter::Core => {
            if live_enemies >= tuning.max_enemies {
                return SpawnDecision::Nothing;
            }
            (tuning.launch_period_ticks, SpawnDecision::LaunchEnemy)
        }
    };
    if rng.gen_range(0..period.max(1)) != 0 {
        return SpawnDecision::Nothing;
    }
    let chance = spawn_probability(distance_sq, tuning).clamp(0.0, 1.0);
    if rng.gen_bool(chance) {
        outcome
    } else {
        SpawnDecision::Nothing
    }
}

/// Offset from the core for a launched enemy.
pub fn launch_offset<R: Rng>(tuning: &SpawnTuning, rng: &mut R) -> (i16, i16) {
    let j = tuning.launch_jitter.max(0);
    (rng.gen_range(-j..=j), rng.gen_range(-j..=j))
}

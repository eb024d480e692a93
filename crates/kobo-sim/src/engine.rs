//! Simulation engine: the authoritative game round.
//!
//! `SimulationEngine` owns the actor world, the level set and both player
//! slots. Each `tick` runs the systems in a fixed order and leaves the world
//! ready for `build_view`. It does no I/O, so whole rounds can be replayed
//! and compared in tests.

use glam::I16Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kobo_ai::spawn::SpawnTuning;
use kobo_core::commands::CommandList;
use kobo_core::constants::{
    LEVEL_CLEAR_DELAY_TICKS, MAX_PLAYERS, RESPAWN_DELAY_TICKS, SPRITE_SIZE, STARTING_LIVES,
    VIEW_HEIGHT, VIEW_WIDTH,
};
use kobo_core::enums::RoundPhase;
use kobo_core::input::InputSource;
use kobo_core::level::{LevelSet, SpawnPoint};
use kobo_core::types::Playfield;

use crate::actors::ActorKind;
use crate::arena::ActorId;
use crate::players::{self, PlayerInfo};
use crate::systems;
use crate::world::{World, WorldEvent};
use crate::world_setup;

/// Configuration for starting a new round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed. Same seed and same inputs give the same round.
    pub seed: u64,
    /// Whether slot 1 plays.
    pub two_player: bool,
    pub start_level: usize,
    pub lives: i32,
    /// Size of each player's view in pixels.
    pub view_size: I16Vec2,
    pub tuning: SpawnTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            two_player: false,
            start_level: 0,
            lives: STARTING_LIVES,
            view_size: I16Vec2::new(VIEW_WIDTH, VIEW_HEIGHT),
            tuning: SpawnTuning::default(),
        }
    }
}

/// What happened in one tick, for loop bookkeeping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub phase: RoundPhase,
    pub level: usize,
    pub fortresses: usize,
    pub actors: usize,
    pub enemies: usize,
    /// A new level was loaded at the start of this tick.
    pub level_loaded: bool,
}

pub struct SimulationEngine {
    world: World,
    levels: LevelSet,
    level_index: usize,
    players: [PlayerInfo; MAX_PLAYERS],
    phase: RoundPhase,
    fortress_count: usize,
    clear_timer: u32,
    tick: u64,
    config: SimConfig,
}

impl SimulationEngine {
    /// Create an engine and load the configured start level.
    pub fn new(config: SimConfig, levels: LevelSet) -> Self {
        let mut engine = Self {
            world: World::new(Playfield::default(), config.seed, config.tuning.clone()),
            levels,
            level_index: 0,
            players: [
                PlayerInfo::new(config.lives, true),
                PlayerInfo::new(config.lives, config.two_player),
            ],
            phase: RoundPhase::Playing,
            fortress_count: 0,
            clear_timer: 0,
            tick: 0,
            config,
        };
        engine.load_level(engine.config.start_level);
        engine
    }

    /// Advance the round by one tick. `inputs[slot]` drives the ship in
    /// `slot`; missing slots are idle.
    pub fn tick(&mut self, inputs: &[&dyn InputSource]) -> TickSummary {
        self.world.background.clear();
        let mut level_loaded = false;

        match self.phase {
            RoundPhase::GameOver => {
                self.tick += 1;
                return self.summary(level_loaded);
            }
            RoundPhase::LevelCleared => {
                self.clear_timer = self.clear_timer.saturating_sub(1);
                if self.clear_timer == 0 {
                    self.load_level(self.level_index + 1);
                    level_loaded = true;
                }
            }
            RoundPhase::Playing => {}
        }

        self.respawn_ships();
        self.publish_ships();

        systems::update::run(&mut self.world, inputs);
        self.world.assign_partitions();
        systems::collision::run(&mut self.world, inputs);
        systems::cleanup::run(&mut self.world, &mut self.players);
        self.world.assign_partitions();

        self.process_events();
        self.check_game_over();
        self.follow_cameras();

        debug_assert!(
            self.world.check_invariants().is_ok(),
            "world invariants broken: {:?}",
            self.world.check_invariants()
        );

        self.tick += 1;
        self.summary(level_loaded)
    }

    /// Append the view for `slot` to `out`.
    pub fn build_view(&self, slot: usize, out: &mut CommandList) {
        self.build_view_with(slot, &CommandList::new(), out);
    }

    /// Like `build_view`, with older background edits the viewer has not
    /// received yet placed ahead of this tick's.
    pub fn build_view_with(&self, slot: usize, carried: &CommandList, out: &mut CommandList) {
        systems::view::build(
            &self.world,
            &self.players,
            slot,
            self.config.view_size,
            &[carried, &self.world.background],
            out,
        );
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    pub fn player(&self, slot: usize) -> Option<&PlayerInfo> {
        self.players.get(slot)
    }

    /// Index of the current level within the level set.
    pub fn level_index(&self) -> usize {
        self.level_index
    }

    /// Fortresses still standing on this level.
    pub fn fortress_count(&self) -> usize {
        self.fortress_count
    }

    pub fn actor_count(&self) -> usize {
        self.world.actor_count()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[cfg(test)]
    pub(crate) fn players_mut(&mut self) -> &mut [PlayerInfo; MAX_PLAYERS] {
        &mut self.players
    }

    fn summary(&self, level_loaded: bool) -> TickSummary {
        TickSummary {
            tick: self.tick,
            phase: self.phase,
            level: self.level_index,
            fortresses: self.fortress_count,
            actors: self.world.actor_count(),
            enemies: self.world.live_enemies(),
            level_loaded,
        }
    }

    /// Replace the current level with level `index` (wrapping past the end).
    /// Ships in play keep their actors and are moved to new start points.
    pub fn load_level(&mut self, index: usize) {
        self.level_index = index % self.levels.len();
        let level = self.levels.get(self.level_index).clone();

        let stale: Vec<ActorId> = self
            .world
            .actors()
            .filter(|(_, actor)| !matches!(actor.kind, ActorKind::Player(_)))
            .map(|(id, _)| id)
            .collect();
        for id in stale {
            self.world.discard(id);
        }
        systems::cleanup::run(&mut self.world, &mut self.players);
        // Discarded actors never report, so nothing from the old level leaks.
        self.world.take_events();

        for area in &level.fortresses {
            world_setup::spawn_fortress(&mut self.world, area);
        }
        self.fortress_count = level.fortresses.len();
        world_setup::spawn_enemies(&mut self.world, level.enemies);

        let starts = self.pick_starts(&level.player_starts);
        for (slot, start) in starts.into_iter().enumerate() {
            let Some(point) = start else {
                continue;
            };
            self.place_ship(slot, &point);
        }

        self.world.assign_partitions();
        self.phase = if self.fortress_count == 0 {
            self.clear_timer = LEVEL_CLEAR_DELAY_TICKS;
            RoundPhase::LevelCleared
        } else {
            RoundPhase::Playing
        };
        info!(
            level = self.level_index,
            fortresses = self.fortress_count,
            enemies = level.enemies,
            "level_loaded"
        );
    }

    /// Distinct start points for each active slot, when the level has enough.
    fn pick_starts(&mut self, starts: &[SpawnPoint]) -> [Option<SpawnPoint>; MAX_PLAYERS] {
        let mut picked = [None; MAX_PLAYERS];
        if starts.is_empty() {
            return picked;
        }
        let mut taken: Vec<usize> = Vec::with_capacity(MAX_PLAYERS);
        for (slot, choice) in picked.iter_mut().enumerate() {
            if !self.players[slot].in_play() {
                continue;
            }
            let mut index = self.world.rng.gen_range(0..starts.len());
            if taken.len() < starts.len() {
                while taken.contains(&index) {
                    index = self.world.rng.gen_range(0..starts.len());
                }
            }
            taken.push(index);
            *choice = Some(starts[index]);
        }
        picked
    }

    /// Move the ship in `slot` to `point`, spawning one if it has none.
    fn place_ship(&mut self, slot: usize, point: &SpawnPoint) {
        let position = self.world.playfield().wrap(point.location);
        let existing = self.players[slot].actor;
        let mut moved = false;
        if let Some(actor) = existing.and_then(|id| self.world.actor_mut(id)) {
            let body = &mut actor.body;
            if let ActorKind::Player(ship) = &mut actor.kind {
                ship.reset(body, position, point.heading);
                moved = true;
            }
        }
        match existing {
            Some(id) if moved => self.world.needs_new_partition.push(id),
            _ => {
                let id = world_setup::spawn_ship(&mut self.world, slot as u8, point);
                self.players[slot].actor = Some(id);
            }
        }
        self.players[slot].respawn_timer = 0;
        self.players[slot].camera = position + I16Vec2::splat(SPRITE_SIZE / 2);
    }

    fn respawn_ships(&mut self) {
        for slot in 0..MAX_PLAYERS {
            let player = &mut self.players[slot];
            if !player.active || player.actor.is_some() || player.lives <= 0 {
                continue;
            }
            if player.respawn_timer > 0 {
                player.respawn_timer -= 1;
                continue;
            }
            let starts = &self.levels.get(self.level_index).player_starts;
            if starts.is_empty() {
                continue;
            }
            let point = starts[self.world.rng.gen_range(0..starts.len())];
            self.place_ship(slot, &point);
            debug!(slot, lives = self.players[slot].lives, "ship_respawned");
        }
    }

    fn publish_ships(&mut self) {
        let mut ships = [None; MAX_PLAYERS];
        for (ship, player) in ships.iter_mut().zip(&self.players) {
            *ship = player
                .actor
                .and_then(|id| self.world.actor(id))
                .filter(|actor| !actor.body.is_destroyed())
                .map(|actor| actor.body.position());
        }
        self.world.set_ships(ships);
    }

    fn process_events(&mut self) {
        for event in self.world.take_events() {
            match event {
                WorldEvent::FortressDestroyed => {
                    self.fortress_count = self.fortress_count.saturating_sub(1);
                    info!(remaining = self.fortress_count, "fortress_destroyed");
                    if self.fortress_count == 0 && self.phase == RoundPhase::Playing {
                        self.phase = RoundPhase::LevelCleared;
                        self.clear_timer = LEVEL_CLEAR_DELAY_TICKS;
                        info!(level = self.level_index, "level_cleared");
                    }
                }
                WorldEvent::ShipLost { slot } => {
                    let Some(player) = self.players.get_mut(slot as usize) else {
                        continue;
                    };
                    player.actor = None;
                    player.lives = (player.lives - 1).max(0);
                    player.respawn_timer = RESPAWN_DELAY_TICKS;
                    info!(slot, lives = player.lives, "ship_lost");
                }
                WorldEvent::Scored { slot, points } => {
                    if let Some(player) = self.players.get_mut(slot as usize) {
                        player.score += points;
                    }
                }
            }
        }
    }

    fn check_game_over(&mut self) {
        if self.phase == RoundPhase::GameOver {
            return;
        }
        if self.players.iter().any(PlayerInfo::in_play) {
            return;
        }
        self.phase = RoundPhase::GameOver;
        info!(
            level = self.level_index,
            score0 = self.players[0].score,
            score1 = self.players[1].score,
            "game_over"
        );
    }

    fn follow_cameras(&mut self) {
        let playfield = self.world.playfield();
        for player in self.players.iter_mut() {
            let Some(actor) = player.actor.and_then(|id| self.world.actor(id)) else {
                continue;
            };
            let target = playfield.wrap(actor.bounds().center());
            player.camera = players::follow_camera(player.camera, target, playfield);
        }
    }
}

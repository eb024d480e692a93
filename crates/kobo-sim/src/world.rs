//! The actor world: storage, spatial index and lifecycle bookkeeping.
//!
//! Actors are never unlinked while a pass is iterating. Spawns go to the
//! needs-new-partition list, destructions to the pending-delete list, and
//! both lists are applied between passes.

use glam::I16Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use kobo_ai::spawn::SpawnTuning;
use kobo_core::commands::CommandList;
use kobo_core::constants::PARTITION_GRID_COUNT;
use kobo_core::input::InputSource;
use kobo_core::types::{CellPos, Playfield};

use crate::actors::{fortress, Actor, DestroyKind, FortressAction, Spawn, TickContext};
use crate::arena::{ActorId, Arena};
use crate::partition::{PartitionGrid, PartitionSlot};

/// Things the engine reacts to once the tick's sweep is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// A fortress core fell.
    FortressDestroyed,
    /// The ship in `slot` was destroyed.
    ShipLost { slot: u8 },
    /// `points` were earned by `slot`.
    Scored { slot: u8, points: i32 },
}

pub struct World {
    pub(crate) actors: Arena<Actor>,
    pub(crate) partitions: PartitionGrid,
    pub(crate) playfield: Playfield,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) tuning: SpawnTuning,
    pub(crate) needs_new_partition: Vec<ActorId>,
    pub(crate) pending_delete: Vec<ActorId>,
    pub(crate) collision_sources: Vec<ActorId>,
    pub(crate) spawns: Vec<Spawn>,
    pub(crate) fortress_actions: Vec<FortressAction>,
    /// Background cell edits made since the engine last cleared it.
    pub(crate) background: CommandList,
    pub(crate) events: Vec<WorldEvent>,
    pub(crate) ships: [Option<I16Vec2>; 2],
    pub(crate) live_enemies: usize,
}

impl World {
    pub fn new(playfield: Playfield, seed: u64, tuning: SpawnTuning) -> Self {
        Self {
            actors: Arena::new(),
            partitions: PartitionGrid::new(playfield, PARTITION_GRID_COUNT),
            playfield,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tuning,
            needs_new_partition: Vec::new(),
            pending_delete: Vec::new(),
            collision_sources: Vec::new(),
            spawns: Vec::new(),
            fortress_actions: Vec::new(),
            background: CommandList::new(),
            events: Vec::new(),
            ships: [None; 2],
            live_enemies: 0,
        }
    }

    pub fn playfield(&self) -> Playfield {
        self.playfield
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> + '_ {
        self.actors.iter()
    }

    pub fn partitions(&self) -> &PartitionGrid {
        &self.partitions
    }

    pub fn live_enemies(&self) -> usize {
        self.live_enemies
    }

    /// Background cell edits not yet sent to views.
    pub fn background_changes(&self) -> &CommandList {
        &self.background
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Register a new actor. It joins a partition at the next reassignment.
    pub fn add_actor(&mut self, actor: Actor) -> ActorId {
        let is_source = !actor.body.source_mask.is_empty();
        let is_enemy = actor.is_enemy();
        let id = self.actors.insert(actor);
        if let Some(actor) = self.actors.get_mut(id) {
            actor.body.set_id(id);
        }
        if is_source {
            self.collision_sources.push(id);
        }
        if is_enemy {
            self.live_enemies += 1;
        }
        self.needs_new_partition.push(id);
        id
    }

    /// Soft-delete. The actor stays listed until the next sweep.
    pub fn destroy(&mut self, id: ActorId) {
        if let Some(actor) = self.actors.get_mut(id) {
            actor.body.destroy();
        }
        self.enqueue_if_destroyed(id);
    }

    /// Destroy without running the destruction handler.
    pub fn discard(&mut self, id: ActorId) {
        if let Some(actor) = self.actors.get_mut(id) {
            drop(actor.body.take_destruction_handler());
            if actor.as_fortress().is_some() && !actor.body.is_destroyed() {
                self.background
                    .clear_background_cell(CellPos::from_world(actor.body.position()));
            }
        }
        self.destroy(id);
    }

    pub(crate) fn enqueue_if_destroyed(&mut self, id: ActorId) {
        if let Some(actor) = self.actors.get_mut(id) {
            if actor.body.take_delete_ticket() {
                self.pending_delete.push(id);
            }
        }
    }

    /// Publish ship positions for behaviours that chase or aim at players.
    pub fn set_ships(&mut self, ships: [Option<I16Vec2>; 2]) {
        self.ships = ships;
    }

    /// Move every actor on the needs-new-partition list into the partition
    /// containing its position.
    pub fn assign_partitions(&mut self) {
        let moving = std::mem::take(&mut self.needs_new_partition);
        for id in moving {
            let Some(actor) = self.actors.get(id) else {
                continue;
            };
            if actor.body.is_destroyed() {
                continue;
            }
            let cell = self.partitions.index_of(actor.body.position());
            if actor.body.partition().map(|slot| slot.cell) == Some(cell) {
                continue;
            }
            self.unlink(id);
            let slot = self.partitions.insert(cell, id);
            if let Some(actor) = self.actors.get_mut(id) {
                actor.body.partition = Some(slot);
            }
        }
    }

    /// Remove `id` from its partition, patching the slot of whichever actor
    /// took its place.
    pub(crate) fn unlink(&mut self, id: ActorId) {
        let Some(slot) = self.actors.get_mut(id).and_then(|a| a.body.partition.take()) else {
            return;
        };
        debug_assert_eq!(
            self.partitions.members(slot.cell).get(slot.index),
            Some(&id),
            "actor {id} not where its partition slot says"
        );
        if let Some(moved) = self.partitions.remove(slot) {
            if let Some(actor) = self.actors.get_mut(moved) {
                actor.body.partition = Some(PartitionSlot {
                    cell: slot.cell,
                    index: slot.index,
                });
            }
        }
    }

    /// Run `f` on one actor with a behaviour context, then apply whatever it
    /// asked for: fortress destructions, spawns and its own destruction.
    pub(crate) fn with_context<F>(&mut self, id: ActorId, inputs: &[&dyn InputSource], f: F)
    where
        F: FnOnce(&mut Actor, &mut TickContext<'_>),
    {
        let Some(actor) = self.actors.get_mut(id) else {
            return;
        };
        let mut ctx = TickContext {
            playfield: self.playfield,
            rng: &mut self.rng,
            inputs,
            ships: self.ships,
            tuning: &self.tuning,
            live_enemies: self.live_enemies,
            spawns: &mut self.spawns,
            fortress_actions: &mut self.fortress_actions,
        };
        f(actor, &mut ctx);
        self.enqueue_if_destroyed(id);
        self.flush_requests();
    }

    pub(crate) fn flush_requests(&mut self) {
        while !self.fortress_actions.is_empty() {
            let actions = std::mem::take(&mut self.fortress_actions);
            for action in actions {
                fortress::destroy(self, action);
            }
        }
        let spawns = std::mem::take(&mut self.spawns);
        for spawn in spawns {
            self.spawn(spawn);
        }
    }

    pub fn spawn(&mut self, spawn: Spawn) -> ActorId {
        let actor = match spawn {
            Spawn::Projectile {
                position,
                direction,
                speed,
                owner,
            } => Actor::projectile(position, direction, speed, owner),
            Spawn::Explosion {
                position,
                direction,
                speed,
            } => Actor::explosion(position, direction, speed),
            Spawn::Enemy { position } => Actor::enemy(position, &mut self.rng),
        };
        self.add_actor(actor)
    }

    /// Bring a fortress node down outside of a collision, crediting `killer`.
    pub fn destroy_fortress_node(&mut self, node: ActorId, kind: DestroyKind, killer: Option<u8>) {
        fortress::destroy(self, FortressAction { node, kind, killer });
        self.flush_requests();
    }

    /// Whether `source` would hit `target` this tick.
    pub fn collision_check(&self, source: ActorId, target: ActorId) -> bool {
        if source == target {
            return false;
        }
        let (Some(a), Some(b)) = (self.actors.get(source), self.actors.get(target)) else {
            return false;
        };
        !a.body.is_destroyed()
            && !b.body.is_destroyed()
            && a.body.source_mask.intersects(b.body.target_mask)
            && a.bounds().overlaps_mod(&b.bounds(), self.playfield.size())
    }

    /// Drain queued events.
    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Verify partition membership and fortress link symmetry.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (id, actor) in self.actors.iter() {
            if actor.body.is_destroyed() {
                continue;
            }
            let Some(slot) = actor.body.partition() else {
                return Err(format!("live actor {id} has no partition"));
            };
            if self.partitions.members(slot.cell).get(slot.index) != Some(&id) {
                return Err(format!("actor {id} missing from partition slot {slot:?}"));
            }
            let bounds = self.partitions.partition(slot.cell).bounds;
            let position = self.playfield.wrap(actor.body.position());
            if !bounds.contains(position) {
                return Err(format!(
                    "actor {id} at {position:?} outside partition {} bounds",
                    slot.cell
                ));
            }
            if let Some(node) = actor.as_fortress() {
                for side in crate::actors::Side::ALL {
                    let Some(other) = node.link(side) else {
                        continue;
                    };
                    let back = self
                        .actors
                        .get(other)
                        .and_then(|a| a.as_fortress())
                        .and_then(|n| n.link(side.opposite()));
                    if back != Some(id) {
                        return Err(format!("fortress link {id} -> {other} is one-way"));
                    }
                }
            }
        }
        let listed: usize = (0..self.partitions.len())
            .map(|cell| self.partitions.members(cell).len())
            .sum();
        let destroyed_listed = (0..self.partitions.len())
            .flat_map(|cell| self.partitions.members(cell).iter())
            .filter(|id| {
                self.actors
                    .get(**id)
                    .map(|a| a.body.is_destroyed())
                    .unwrap_or(true)
            })
            .count();
        let live = self
            .actors
            .iter()
            .filter(|(_, a)| !a.body.is_destroyed())
            .count();
        if listed - destroyed_listed != live {
            return Err(format!(
                "{} partition entries for {live} live actors",
                listed - destroyed_listed
            ));
        }
        Ok(())
    }
}

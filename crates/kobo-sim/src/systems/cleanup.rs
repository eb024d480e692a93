//! Pending-delete sweep.
//!
//! Frees every actor destroyed this tick: drops it from the collision
//! sources, the player slots and its partition, credits its killer, runs its
//! destruction handler, and releases it.

use tracing::trace;

use crate::players::PlayerInfo;
use crate::world::{World, WorldEvent};

pub fn run(world: &mut World, players: &mut [PlayerInfo]) {
    let pending = std::mem::take(&mut world.pending_delete);
    for id in pending {
        let Some(actor) = world.actors.get(id) else {
            debug_assert!(false, "pending delete for unknown actor {id}");
            continue;
        };
        debug_assert!(actor.body.is_destroyed(), "actor {id} queued but not destroyed");

        if !actor.body.source_mask.is_empty() {
            let found = world.collision_sources.iter().position(|s| *s == id);
            debug_assert!(found.is_some(), "collision source {id} not registered");
            if let Some(index) = found {
                world.collision_sources.swap_remove(index);
            }
        }

        for player in players.iter_mut() {
            if player.actor == Some(id) {
                player.actor = None;
            }
        }

        world.unlink(id);

        let Some(mut actor) = world.actors.remove(id) else {
            continue;
        };
        if actor.is_enemy() {
            world.live_enemies = world.live_enemies.saturating_sub(1);
        }
        if let Some(slot) = actor.body.killer {
            let points = actor.score();
            if points > 0 {
                world.events.push(WorldEvent::Scored { slot, points });
            }
        }
        if let Some(handler) = actor.body.take_destruction_handler() {
            handler(&mut world.events);
        }
        trace!(actor = %id, "actor_freed");
    }
}

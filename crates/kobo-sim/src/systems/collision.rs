//! Collision pass.
//!
//! Each collision source looks only at the partitions its bounds can reach.
//! A hit notifies the target first, then the source, skipping either one if
//! it has already been destroyed.

use kobo_core::input::InputSource;

use crate::arena::ActorId;
use crate::world::World;

pub fn run(world: &mut World, inputs: &[&dyn InputSource]) {
    let mut candidates: Vec<ActorId> = Vec::new();
    let source_count = world.collision_sources.len();
    for i in 0..source_count {
        let source_id = world.collision_sources[i];
        let Some(source) = world.actors.get(source_id) else {
            continue;
        };
        if source.body.is_destroyed() {
            continue;
        }
        let bounds = source.bounds();
        let range = world.partitions.range(&bounds);

        candidates.clear();
        for cell in range.cells() {
            debug_assert!(
                world
                    .partitions
                    .partition(cell)
                    .extended_bounds
                    .overlaps_mod(&bounds, world.playfield.size()),
                "partition {cell} outside reach of {bounds:?}"
            );
            candidates.extend_from_slice(world.partitions.members(cell));
        }

        for &target_id in &candidates {
            if !world.collision_check(source_id, target_id) {
                continue;
            }
            resolve_hit(world, source_id, target_id, inputs);
            let source_gone = world
                .actors
                .get(source_id)
                .map_or(true, |a| a.body.is_destroyed());
            if source_gone {
                break;
            }
        }
    }
}

fn resolve_hit(world: &mut World, source: ActorId, target: ActorId, inputs: &[&dyn InputSource]) {
    let (Some(source_contact), Some(target_contact)) = (
        world.actors.get(source).map(|a| a.contact()),
        world.actors.get(target).map(|a| a.contact()),
    ) else {
        return;
    };

    if is_live(world, target) {
        world.with_context(target, inputs, |actor, ctx| {
            actor.on_collision(&source_contact, ctx)
        });
    }
    if is_live(world, source) {
        world.with_context(source, inputs, |actor, ctx| {
            actor.on_collision(&target_contact, ctx)
        });
    }
}

fn is_live(world: &World, id: ActorId) -> bool {
    world
        .actors
        .get(id)
        .is_some_and(|a| !a.body.is_destroyed())
}

//! Behaviour pass.
//!
//! Walks every partition back to front and updates each live actor. Actors
//! that moved out of their partition's bounds are queued for reassignment;
//! nothing is unlinked while the walk is in progress.

use kobo_core::input::InputSource;

use crate::world::World;

pub fn run(world: &mut World, inputs: &[&dyn InputSource]) {
    for cell in 0..world.partitions.len() {
        let mut index = world.partitions.members(cell).len();
        while index > 0 {
            index -= 1;
            let id = world.partitions.members(cell)[index];
            let live = world
                .actors
                .get(id)
                .is_some_and(|actor| !actor.body.is_destroyed());
            if !live {
                continue;
            }

            world.with_context(id, inputs, |actor, ctx| actor.update(ctx));

            let bounds = world.partitions.partition(cell).bounds;
            let playfield = world.playfield;
            let Some(actor) = world.actors.get_mut(id) else {
                continue;
            };
            if actor.body.is_destroyed() || !actor.body.is_position_dirty() {
                continue;
            }
            actor.body.clear_position_dirty();
            if !bounds.contains(playfield.wrap(actor.body.position())) {
                world.needs_new_partition.push(id);
            }
        }
    }
}

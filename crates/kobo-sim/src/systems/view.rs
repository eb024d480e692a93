//! Per-viewpoint command stream.
//!
//! A view is everything a presentation layer needs to redraw one player's
//! screen: where the view sits, what changed in the background since the
//! last frame, the sprites it can see, and both players' stats.

use glam::I16Vec2;

use kobo_core::commands::CommandList;
use kobo_core::constants::MAX_PLAYERS;
use kobo_core::enums::StatKind;
use kobo_core::types::Rect;

use crate::players::PlayerInfo;
use crate::world::World;

/// Top-left corner of a `view_size` view centred on `camera`.
pub fn view_offset(world: &World, camera: I16Vec2, view_size: I16Vec2) -> I16Vec2 {
    world.playfield().wrap(camera - view_size / 2)
}

/// Append the view for `slot` to `out`. `background` holds the cell edits
/// the receiving side has not seen yet, oldest first.
pub fn build(
    world: &World,
    players: &[PlayerInfo],
    slot: usize,
    view_size: I16Vec2,
    background: &[&CommandList],
    out: &mut CommandList,
) {
    let Some(viewer) = players.get(slot) else {
        return;
    };
    let offset = view_offset(world, viewer.camera, view_size);
    out.set_view_offset(offset);

    for changes in background {
        out.extend(changes.background_changes().copied());
    }
    out.draw_background();

    let visible = Rect::from_origin_size(offset, view_size);
    let world_size = world.playfield().size();
    for cell in world.partitions().range(&visible).cells() {
        for id in world.partitions().members(cell) {
            let Some(actor) = world.actor(*id) else {
                continue;
            };
            if actor.body.is_destroyed() {
                continue;
            }
            if actor.bounds().overlaps_mod(&visible, world_size) {
                actor.draw(out);
            }
        }
    }

    let mut positions = [I16Vec2::ZERO; MAX_PLAYERS];
    for (position, player) in positions.iter_mut().zip(players) {
        *position = player
            .actor
            .and_then(|id| world.actor(id))
            .map(|actor| actor.body.position())
            .unwrap_or(player.camera);
    }
    out.set_player_positions(positions);

    for (index, player) in players.iter().enumerate().take(MAX_PLAYERS) {
        out.set_player_stat(StatKind::Score, index as u8, player.score);
        out.set_player_stat(StatKind::Lives, index as u8, player.lives);
    }
}

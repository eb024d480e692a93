//! Actor factories for populating a level.
//!
//! Fortresses are carved as random mazes: a depth-first walk on an odd-sized
//! grid where every second cell is a room and the cells between rooms are
//! corridors. The core sits in the middle and every node ends up connected to
//! it.

use glam::{I16Vec2, IVec2};
use rand::Rng;
use tracing::debug;

use kobo_core::constants::FORTRESS_CELL_SIZE;
use kobo_core::level::SpawnPoint;
use kobo_core::types::{CellPos, Rect};

use crate::actors::{Actor, Side};
use crate::arena::ActorId;
use crate::world::{World, WorldEvent};

/// Occupancy grid of a carved fortress, before any actor exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FortressLayout {
    pub grid_size: IVec2,
    cells: Vec<bool>,
    pub core: IVec2,
}

impl FortressLayout {
    fn empty(grid_size: IVec2) -> Self {
        Self {
            grid_size,
            cells: vec![false; (grid_size.x * grid_size.y) as usize],
            core: grid_size / 2,
        }
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.grid_size.x && cell.y < self.grid_size.y
    }

    pub fn is_occupied(&self, cell: IVec2) -> bool {
        self.in_bounds(cell) && self.cells[self.index(cell)]
    }

    fn is_free(&self, cell: IVec2) -> bool {
        self.in_bounds(cell) && !self.cells[self.index(cell)]
    }

    fn occupy(&mut self, cell: IVec2) {
        let index = self.index(cell);
        self.cells[index] = true;
    }

    fn index(&self, cell: IVec2) -> usize {
        (cell.y * self.grid_size.x + cell.x) as usize
    }

    pub fn node_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = IVec2> + '_ {
        (0..self.grid_size.y).flat_map(move |y| {
            (0..self.grid_size.x)
                .map(move |x| IVec2::new(x, y))
                .filter(|cell| self.is_occupied(*cell))
        })
    }

    /// One text row per grid row, `#` for nodes.
    pub fn rows(&self) -> Vec<String> {
        (0..self.grid_size.y)
            .map(|y| {
                (0..self.grid_size.x)
                    .map(|x| {
                        if self.is_occupied(IVec2::new(x, y)) {
                            '#'
                        } else {
                            '.'
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Grid dimension for a fortress rectangle side: the side in 16 px cells,
/// rounded to the nearest odd count.
pub fn fortress_grid_size(size: I16Vec2) -> IVec2 {
    (size.as_ivec2().max(IVec2::ZERO) + IVec2::splat(15)) / 32 * 2 + IVec2::ONE
}

const STEPS: [IVec2; 4] = [
    IVec2::new(0, -2),
    IVec2::new(2, 0),
    IVec2::new(0, 2),
    IVec2::new(-2, 0),
];

/// Carve a maze filling a fortress rectangle of `size` pixels.
pub fn carve_fortress<R: Rng>(size: I16Vec2, rng: &mut R) -> FortressLayout {
    let mut layout = FortressLayout::empty(fortress_grid_size(size));
    let start = layout.core;
    layout.occupy(start);

    let arm = if rng.gen::<bool>() {
        IVec2::new(0, 1)
    } else {
        IVec2::new(1, 0)
    };
    let mut stack: Vec<IVec2> = [start - arm, start + arm]
        .into_iter()
        .filter(|cell| layout.in_bounds(*cell))
        .collect();
    for cell in &stack {
        layout.occupy(*cell);
    }

    let mut choices: Vec<IVec2> = Vec::with_capacity(STEPS.len());
    while !stack.is_empty() {
        let current = stack.remove(rng.gen_range(0..stack.len()));

        choices.clear();
        choices.extend(
            STEPS
                .iter()
                .map(|step| current + *step)
                .filter(|next| layout.is_free(*next)),
        );
        if choices.is_empty() {
            continue;
        }

        let next = choices[rng.gen_range(0..choices.len())];
        layout.occupy((current + next) / 2);
        layout.occupy(next);
        stack.push(next);
        stack.push(current);
    }
    layout
}

/// Place the nodes of `layout` with the grid's top-left cell at `origin` and
/// link every pair of adjacent nodes. Returns the core.
pub fn build_fortress(world: &mut World, origin: I16Vec2, layout: &FortressLayout) -> ActorId {
    let playfield = world.playfield();
    let mut ids: Vec<Option<ActorId>> = vec![None; layout.cells.len()];
    let mut core = None;

    for cell in layout.occupied() {
        let offset = (cell * FORTRESS_CELL_SIZE as i32).as_i16vec2();
        let position = playfield.wrap(origin + offset);
        let is_core = cell == layout.core;
        let id = world.add_actor(Actor::fortress_node(position, is_core));
        ids[layout.index(cell)] = Some(id);
        if is_core {
            core = Some(id);
        }
    }

    for cell in layout.occupied() {
        let Some(id) = ids[layout.index(cell)] else {
            continue;
        };
        let mut links = [None; 4];
        for side in Side::ALL {
            let neighbour = cell + side.grid_offset();
            if layout.is_occupied(neighbour) {
                links[side as usize] = ids[layout.index(neighbour)];
            }
        }
        let Some(actor) = world.actor_mut(id) else {
            continue;
        };
        let position = actor.body.position();
        let Some(node) = actor.as_fortress_mut() else {
            continue;
        };
        for side in Side::ALL {
            node.set_link(side, links[side as usize]);
        }
        node.update_shape();
        let tile = node.tile();
        world
            .background
            .set_background_cell(CellPos::from_world(position), tile);
    }

    for row in layout.rows() {
        debug!(row = %row, "fortress_row");
    }

    // The grid centre is always occupied, so there is always a core.
    let core = core.unwrap_or_else(|| world.add_actor(Actor::fortress_node(origin, true)));
    if let Some(actor) = world.actor_mut(core) {
        actor
            .body
            .set_destruction_handler(Box::new(|events: &mut Vec<WorldEvent>| {
                events.push(WorldEvent::FortressDestroyed)
            }));
    }
    core
}

/// Carve and place a fortress for one level rectangle.
pub fn spawn_fortress(world: &mut World, area: &Rect) -> ActorId {
    let layout = carve_fortress(area.size, &mut world.rng);
    debug!(
        x = area.origin.x,
        y = area.origin.y,
        nodes = layout.node_count(),
        "fortress_carved"
    );
    build_fortress(world, area.origin, &layout)
}

/// Spawn a ship for `slot` that reports its own loss.
pub fn spawn_ship(world: &mut World, slot: u8, point: &SpawnPoint) -> ActorId {
    let position = world.playfield().wrap(point.location);
    let mut actor = Actor::player(slot, position, point.heading);
    actor
        .body
        .set_destruction_handler(Box::new(move |events: &mut Vec<WorldEvent>| {
            events.push(WorldEvent::ShipLost { slot })
        }));
    world.add_actor(actor)
}

/// Spawn `count` enemies at random positions.
pub fn spawn_enemies(world: &mut World, count: u32) {
    let size = world.playfield().size();
    for _ in 0..count {
        let position = I16Vec2::new(
            world.rng.gen_range(0..size.x),
            world.rng.gen_range(0..size.y),
        );
        let actor = Actor::enemy(position, &mut world.rng);
        world.add_actor(actor);
    }
}

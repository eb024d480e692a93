//! Fortress nodes.
//!
//! A fortress is a grid graph of static nodes around one core. Each node
//! links to at most four neighbours. Only the core and nodes with exactly one
//! link can be shot. When a node falls its neighbours do not react at once:
//! each is scheduled to reshape or to fall itself `FORTRESS_CHAIN_DELAY`
//! ticks later, which is what makes destruction ripple through corridors.
//!
//! Nodes are drawn as background cells, so they emit cell edits when their
//! shape changes instead of a sprite every frame.

use glam::{I16Vec2, IVec2};

use kobo_ai::spawn::{self, Emitter, SpawnDecision};
use kobo_core::commands::{CommandList, SpriteImage};
use kobo_core::constants::{
    ENEMY_SHOT_SPEED, FORTRESS_CHAIN_DELAY, FORTRESS_EXPLOSION_SPEED, SCORE_FORTRESS_CHAINED,
    SCORE_FORTRESS_CORE, SCORE_FORTRESS_DESTRUCTIBLE, SPRITE_SIZE,
};
use kobo_core::enums::{CollisionMask, ImageSet};
use kobo_core::types::{CellPos, Direction};

use crate::arena::ActorId;
use crate::world::World;

use super::{Actor, ActorBody, ActorKind, Behavior, Contact, FortressAction, Spawn, TickContext};

/// Core tile index within `ImageSet::Fort0`.
const CORE_TILE: u8 = 7;

/// How a node came down. A core loss levels the whole fortress; a leaf loss
/// only eats back along the corridor to the next junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyKind {
    Core,
    Leaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::East => Side::West,
            Side::South => Side::North,
            Side::West => Side::East,
        }
    }

    /// Bit in a neighbour mask: N=1, E=2, S=4, W=8.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Offset to the neighbouring grid cell on this side.
    pub fn grid_offset(self) -> IVec2 {
        match self {
            Side::North => IVec2::new(0, -1),
            Side::East => IVec2::new(1, 0),
            Side::South => IVec2::new(0, 1),
            Side::West => IVec2::new(-1, 0),
        }
    }
}

pub struct FortressNode {
    links: [Option<ActorId>; 4],
    is_core: bool,
    destructible: bool,
    delayed: Option<DestroyKind>,
    delay: i32,
    delayed_killer: Option<u8>,
    tile: SpriteImage,
    points: i32,
}

impl FortressNode {
    pub fn new(is_core: bool) -> Self {
        Self {
            links: [None; 4],
            is_core,
            destructible: false,
            delayed: None,
            delay: 0,
            delayed_killer: None,
            tile: SpriteImage::new(ImageSet::Fort0, CORE_TILE),
            points: if is_core {
                SCORE_FORTRESS_CORE
            } else {
                SCORE_FORTRESS_DESTRUCTIBLE
            },
        }
    }

    pub fn is_core(&self) -> bool {
        self.is_core
    }

    pub fn is_destructible(&self) -> bool {
        self.destructible
    }

    pub fn link(&self, side: Side) -> Option<ActorId> {
        self.links[side as usize]
    }

    pub fn set_link(&mut self, side: Side, neighbour: Option<ActorId>) {
        self.links[side as usize] = neighbour;
    }

    pub fn edge_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_some()).count()
    }

    /// Pending delayed destruction, if any.
    pub fn scheduled(&self) -> Option<DestroyKind> {
        self.delayed
    }

    pub fn tile(&self) -> SpriteImage {
        self.tile
    }

    /// Recompute the tile and whether the node can be shot.
    pub fn update_shape(&mut self) {
        if self.is_core {
            self.tile = SpriteImage::new(ImageSet::Fort0, CORE_TILE);
            self.destructible = true;
            return;
        }
        let sub = [Side::North, Side::East, Side::South]
            .iter()
            .filter(|side| self.link(**side).is_some())
            .fold(0u8, |acc, side| acc | side.bit());
        let set = if self.link(Side::West).is_some() {
            ImageSet::Fort2
        } else {
            ImageSet::Fort1
        };
        self.tile = SpriteImage::new(set, sub);
        self.destructible = self.edge_count() == 1;
    }

    fn schedule(&mut self, kind: DestroyKind, killer: Option<u8>) {
        self.delayed = Some(kind);
        self.delay = FORTRESS_CHAIN_DELAY;
        self.delayed_killer = killer;
        self.destructible = false;
        if !self.is_core {
            self.points = SCORE_FORTRESS_CHAINED;
        }
    }

    fn emitter(&self) -> Emitter {
        if self.is_core {
            Emitter::Core
        } else if self.destructible {
            Emitter::Leaf
        } else {
            Emitter::Wall
        }
    }
}

impl Behavior for FortressNode {
    fn update(&mut self, body: &mut ActorBody, ctx: &mut TickContext<'_>) {
        if let Some(kind) = self.delayed {
            self.delay -= 1;
            if self.delay <= 0 {
                self.delayed = None;
                ctx.fortress_actions.push(FortressAction {
                    node: body.id(),
                    kind,
                    killer: self.delayed_killer,
                });
            }
            return;
        }

        let position = body.position();
        let nearest = ctx.nearest_ship_distance_sq(position);
        let decision = spawn::decide(
            self.emitter(),
            nearest,
            ctx.live_enemies,
            ctx.tuning,
            &mut *ctx.rng,
        );
        match decision {
            SpawnDecision::Nothing => {}
            SpawnDecision::FireShot => {
                let aim = ctx
                    .nearest_ship(position, i32::MAX)
                    .map(Direction::from_delta)
                    .unwrap_or(Direction::Stopped);
                if aim.is_moving() {
                    let muzzle = position + I16Vec2::splat(SPRITE_SIZE / 4);
                    ctx.spawn(Spawn::Projectile {
                        position: ctx.playfield.wrap(muzzle),
                        direction: aim,
                        speed: ENEMY_SHOT_SPEED,
                        owner: None,
                    });
                }
            }
            SpawnDecision::LaunchEnemy => {
                let (dx, dy) = spawn::launch_offset(ctx.tuning, &mut *ctx.rng);
                ctx.spawn(Spawn::Enemy {
                    position: ctx.playfield.wrap(position + I16Vec2::new(dx, dy)),
                });
            }
        }
    }

    fn draw(&self, _body: &ActorBody, _out: &mut CommandList) {}

    fn on_collision(&mut self, body: &mut ActorBody, other: &Contact, ctx: &mut TickContext<'_>) {
        if !self.destructible {
            return;
        }
        self.destructible = false;
        let kind = if self.is_core {
            DestroyKind::Core
        } else {
            DestroyKind::Leaf
        };
        ctx.fortress_actions.push(FortressAction {
            node: body.id(),
            kind,
            killer: other.credited_player,
        });
    }

    fn score(&self) -> i32 {
        self.points
    }
}

impl Actor {
    pub fn fortress_node(position: I16Vec2, is_core: bool) -> Actor {
        Actor::new(
            ActorBody::new(position, CollisionMask::ENEMY_BASE, CollisionMask::NONE),
            ActorKind::FortressNode(FortressNode::new(is_core)),
        )
    }
}

/// Bring a node down: unlink it, leave an explosion heading away from where
/// its links were, and schedule or reshape each former neighbour.
pub(crate) fn destroy(world: &mut World, action: FortressAction) {
    let Some(actor) = world.actors.get_mut(action.node) else {
        return;
    };
    if actor.body.is_destroyed() {
        return;
    }
    let position = actor.body.position();
    let Some(node) = actor.as_fortress_mut() else {
        debug_assert!(false, "fortress action on non-fortress actor {}", action.node);
        return;
    };
    let links = std::mem::replace(&mut node.links, [None; 4]);
    node.delayed = None;
    node.destructible = false;
    actor.body.destroy();
    actor.body.killer = action.killer;
    world.enqueue_if_destroyed(action.node);
    world.background.clear_background_cell(CellPos::from_world(position));

    let mut mask = 0u8;
    for side in Side::ALL {
        let Some(neighbour_id) = links[side as usize] else {
            continue;
        };
        mask |= side.bit();
        let Some(neighbour) = world.actors.get_mut(neighbour_id) else {
            debug_assert!(false, "dangling fortress link {neighbour_id}");
            continue;
        };
        let neighbour_position = neighbour.body.position();
        let Some(node) = neighbour.as_fortress_mut() else {
            continue;
        };
        debug_assert_eq!(
            node.link(side.opposite()),
            Some(action.node),
            "fortress links must be symmetric"
        );
        node.set_link(side.opposite(), None);

        let edges = node.edge_count();
        let chain = action.kind == DestroyKind::Core || (!node.is_core && edges <= 1);
        if chain {
            if node.delayed.is_none() {
                node.schedule(action.kind, action.killer);
            }
        } else if node.delayed.is_none() {
            node.update_shape();
            let tile = node.tile;
            world
                .background
                .set_background_cell(CellPos::from_world(neighbour_position), tile);
        }
    }

    world.spawns.push(Spawn::Explosion {
        position,
        direction: Direction::from_neighbour_mask(mask),
        speed: FORTRESS_EXPLOSION_SPEED,
    });
}

//! Actors: everything that lives on the playfield.
//!
//! An `Actor` is a shared `ActorBody` (position, collision masks, lifecycle
//! flags) plus an `ActorKind` carrying the variant's own state. Variant
//! behaviour goes through the `Behavior` trait; `Actor` dispatches to it.
//!
//! Destruction is soft: `ActorBody::destroy` only raises a flag. The world
//! queues the actor and frees it in the sweep at the end of the tick, after
//! which its destruction handler runs exactly once.

pub mod enemy;
pub mod explosion;
pub mod fortress;
pub mod player;
pub mod projectile;

use glam::{I16Vec2, IVec2};
use rand_chacha::ChaCha8Rng;

use kobo_ai::spawn::SpawnTuning;
use kobo_core::commands::CommandList;
use kobo_core::constants::SPRITE_SIZE;
use kobo_core::enums::CollisionMask;
use kobo_core::input::{IdleInput, InputSource};
use kobo_core::types::{Direction, Playfield, Rect};

use crate::arena::ActorId;
use crate::partition::PartitionSlot;
use crate::world::WorldEvent;

pub use enemy::Enemy;
pub use explosion::Explosion;
pub use fortress::{DestroyKind, FortressNode, Side};
pub use player::Player;
pub use projectile::Projectile;

/// Runs once, right before the actor is freed.
pub type DestructionHandler = Box<dyn FnOnce(&mut Vec<WorldEvent>) + Send>;

static IDLE: IdleInput = IdleInput;

/// State every actor has.
pub struct ActorBody {
    id: ActorId,
    position: I16Vec2,
    position_dirty: bool,
    /// Categories this actor can be hit as.
    pub target_mask: CollisionMask,
    /// Categories this actor actively tests against.
    pub source_mask: CollisionMask,
    destroyed: bool,
    queued_for_delete: bool,
    /// Player credited with the kill.
    pub killer: Option<u8>,
    pub(crate) partition: Option<PartitionSlot>,
    on_destroyed: Option<DestructionHandler>,
}

impl ActorBody {
    pub fn new(position: I16Vec2, target_mask: CollisionMask, source_mask: CollisionMask) -> Self {
        Self {
            id: ActorId::new(u32::MAX, 0),
            position,
            position_dirty: true,
            target_mask,
            source_mask,
            destroyed: false,
            queued_for_delete: false,
            killer: None,
            partition: None,
            on_destroyed: None,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ActorId) {
        self.id = id;
    }

    pub fn position(&self) -> I16Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: I16Vec2) {
        if position != self.position {
            self.position = position;
            self.position_dirty = true;
        }
    }

    pub fn is_position_dirty(&self) -> bool {
        self.position_dirty
    }

    pub(crate) fn clear_position_dirty(&mut self) {
        self.position_dirty = false;
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// True the first time it is called after `destroy`.
    pub(crate) fn take_delete_ticket(&mut self) -> bool {
        if self.destroyed && !self.queued_for_delete {
            self.queued_for_delete = true;
            return true;
        }
        false
    }

    pub fn partition(&self) -> Option<PartitionSlot> {
        self.partition
    }

    pub fn set_destruction_handler(&mut self, handler: DestructionHandler) {
        self.on_destroyed = Some(handler);
    }

    pub(crate) fn take_destruction_handler(&mut self) -> Option<DestructionHandler> {
        self.on_destroyed.take()
    }
}

/// Constant-speed straight-line motion on the torus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    pub direction: Direction,
    pub speed: i16,
}

impl Motion {
    pub fn new(direction: Direction, speed: i16) -> Self {
        Self { direction, speed }
    }

    pub fn advance(&self, body: &mut ActorBody, playfield: Playfield) {
        if self.direction.is_moving() {
            let next = body.position() + self.direction.to_delta(self.speed);
            body.set_position(playfield.wrap(next));
        }
    }
}

/// What a collision callback learns about the other actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub id: ActorId,
    pub position: I16Vec2,
    /// Player credited if this contact destroys something.
    pub credited_player: Option<u8>,
}

/// Actor created as a side effect of another actor's behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spawn {
    Projectile {
        position: I16Vec2,
        direction: Direction,
        speed: i16,
        owner: Option<u8>,
    },
    Explosion {
        position: I16Vec2,
        direction: Direction,
        speed: i16,
    },
    Enemy {
        position: I16Vec2,
    },
}

/// Fortress node destruction requested during a behaviour call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FortressAction {
    pub node: ActorId,
    pub kind: DestroyKind,
    pub killer: Option<u8>,
}

/// World access granted to behaviours for the duration of one call.
pub struct TickContext<'a> {
    pub playfield: Playfield,
    pub rng: &'a mut ChaCha8Rng,
    pub inputs: &'a [&'a dyn InputSource],
    /// Position of each live ship, by player slot.
    pub ships: [Option<I16Vec2>; 2],
    pub tuning: &'a SpawnTuning,
    pub live_enemies: usize,
    pub spawns: &'a mut Vec<Spawn>,
    pub fortress_actions: &'a mut Vec<FortressAction>,
}

impl<'a> TickContext<'a> {
    pub fn input(&self, slot: u8) -> &dyn InputSource {
        match self.inputs.get(slot as usize) {
            Some(input) => *input,
            None => &IDLE,
        }
    }

    /// Shortest offset from `from` to the nearest ship centre, if any ship is
    /// within `range` pixels.
    pub fn nearest_ship(&self, from: I16Vec2, range: i32) -> Option<IVec2> {
        let half = I16Vec2::splat(SPRITE_SIZE / 2);
        let range_sq = range as i64 * range as i64;
        self.ships
            .iter()
            .flatten()
            .map(|ship| self.playfield.shortest_delta(from + half, *ship + half))
            .filter(|delta| delta.length_squared() as i64 <= range_sq)
            .min_by_key(|delta| delta.length_squared())
    }

    /// Squared distance to the nearest ship, if any ship is in play.
    pub fn nearest_ship_distance_sq(&self, from: I16Vec2) -> Option<i64> {
        self.ships
            .iter()
            .flatten()
            .map(|ship| self.playfield.distance_squared(from, *ship) as i64)
            .min()
    }

    pub fn spawn(&mut self, spawn: Spawn) {
        self.spawns.push(spawn);
    }
}

/// Per-variant behaviour.
pub trait Behavior {
    fn update(&mut self, body: &mut ActorBody, ctx: &mut TickContext<'_>);

    /// Collision rectangle in world pixels (unwrapped at the far edges).
    fn bounds(&self, body: &ActorBody) -> Rect {
        Rect::from_origin_size(body.position(), I16Vec2::splat(SPRITE_SIZE))
    }

    fn draw(&self, body: &ActorBody, out: &mut CommandList);

    fn on_collision(&mut self, _body: &mut ActorBody, _other: &Contact, _ctx: &mut TickContext<'_>) {}

    /// Points awarded to the killer.
    fn score(&self) -> i32 {
        0
    }
}

pub enum ActorKind {
    Player(Player),
    Enemy(Enemy),
    Projectile(Projectile),
    Explosion(Explosion),
    FortressNode(FortressNode),
}

pub struct Actor {
    pub body: ActorBody,
    pub kind: ActorKind,
}

impl Actor {
    pub fn new(body: ActorBody, kind: ActorKind) -> Self {
        Self { body, kind }
    }

    fn behavior(&self) -> &dyn Behavior {
        match &self.kind {
            ActorKind::Player(a) => a,
            ActorKind::Enemy(a) => a,
            ActorKind::Projectile(a) => a,
            ActorKind::Explosion(a) => a,
            ActorKind::FortressNode(a) => a,
        }
    }

    fn split_mut(&mut self) -> (&mut ActorBody, &mut dyn Behavior) {
        let behavior: &mut dyn Behavior = match &mut self.kind {
            ActorKind::Player(a) => a,
            ActorKind::Enemy(a) => a,
            ActorKind::Projectile(a) => a,
            ActorKind::Explosion(a) => a,
            ActorKind::FortressNode(a) => a,
        };
        (&mut self.body, behavior)
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        let (body, behavior) = self.split_mut();
        behavior.update(body, ctx);
    }

    pub fn bounds(&self) -> Rect {
        self.behavior().bounds(&self.body)
    }

    pub fn draw(&self, out: &mut CommandList) {
        self.behavior().draw(&self.body, out);
    }

    pub fn on_collision(&mut self, other: &Contact, ctx: &mut TickContext<'_>) {
        let (body, behavior) = self.split_mut();
        behavior.on_collision(body, other, ctx);
    }

    pub fn score(&self) -> i32 {
        self.behavior().score()
    }

    pub fn contact(&self) -> Contact {
        let credited_player = match &self.kind {
            ActorKind::Player(p) => Some(p.slot()),
            ActorKind::Projectile(p) => p.owner(),
            _ => None,
        };
        Contact {
            id: self.body.id(),
            position: self.body.position(),
            credited_player,
        }
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, ActorKind::Enemy(_))
    }

    pub fn as_fortress(&self) -> Option<&FortressNode> {
        match &self.kind {
            ActorKind::FortressNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_fortress_mut(&mut self) -> Option<&mut FortressNode> {
        match &mut self.kind {
            ActorKind::FortressNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            ActorKind::Player(player) => Some(player),
            _ => None,
        }
    }
}


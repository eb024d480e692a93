//! Missiles fired by ships and shots fired by fortresses.

use glam::I16Vec2;

use kobo_core::commands::{CommandList, SpriteImage};
use kobo_core::constants::{PROJECTILE_FLASH_TICKS, PROJECTILE_RANGE};
use kobo_core::enums::{CollisionMask, ImageSet};
use kobo_core::types::{Direction, Rect};

use super::{Actor, ActorBody, ActorKind, Behavior, Contact, Motion, TickContext};

/// Frames in the spinning enemy-shot animation.
const SPIN_FRAMES: u8 = 8;

pub struct Projectile {
    motion: Motion,
    image_set: ImageSet,
    /// Spinning shots cycle their image instead of facing their direction.
    spin: Option<u8>,
    ttl: i32,
    owner: Option<u8>,
}

impl Projectile {
    pub fn new(direction: Direction, speed: i16, owner: Option<u8>) -> Self {
        let image_set = if owner.is_some() {
            ImageSet::Missile
        } else {
            ImageSet::MiniShot
        };
        Self {
            motion: Motion::new(direction, speed),
            image_set,
            spin: (image_set == ImageSet::MiniShot).then_some(0),
            ttl: PROJECTILE_RANGE / speed.max(1) as i32,
            owner,
        }
    }

    /// Slot of the ship that fired this, `None` for fortress shots.
    pub fn owner(&self) -> Option<u8> {
        self.owner
    }

    pub fn ttl(&self) -> i32 {
        self.ttl
    }

    fn visible(&self) -> bool {
        self.ttl > PROJECTILE_FLASH_TICKS || self.ttl % 2 == 1
    }
}

impl Behavior for Projectile {
    fn update(&mut self, body: &mut ActorBody, ctx: &mut TickContext<'_>) {
        self.ttl -= 1;
        if self.ttl <= 0 {
            body.destroy();
            return;
        }
        self.motion.advance(body, ctx.playfield);
        if let Some(frame) = self.spin.as_mut() {
            *frame = (*frame + 1) % SPIN_FRAMES;
        }
    }

    fn bounds(&self, body: &ActorBody) -> Rect {
        match self.spin {
            Some(_) => Rect::from_origin_size(body.position(), I16Vec2::splat(6)),
            None => Rect::from_origin_size(body.position() + I16Vec2::splat(4), I16Vec2::splat(8)),
        }
    }

    fn draw(&self, body: &ActorBody, out: &mut CommandList) {
        if !self.visible() {
            return;
        }
        let index = self.spin.unwrap_or(self.motion.direction.bits());
        out.draw_sprite(body.position(), SpriteImage::new(self.image_set, index));
    }

    fn on_collision(&mut self, body: &mut ActorBody, _other: &Contact, _ctx: &mut TickContext<'_>) {
        body.destroy();
    }
}

impl Actor {
    pub fn projectile(position: I16Vec2, direction: Direction, speed: i16, owner: Option<u8>) -> Actor {
        let (target_mask, source_mask) = match owner {
            Some(_) => (CollisionMask::NONE, CollisionMask::ENEMY),
            None => (CollisionMask::ENEMY_NPC, CollisionMask::PLAYER),
        };
        Actor::new(
            ActorBody::new(position, target_mask, source_mask),
            ActorKind::Projectile(Projectile::new(direction, speed, owner)),
        )
    }
}

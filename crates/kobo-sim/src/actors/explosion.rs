//! Short-lived explosion animation. Drifts with the momentum of whatever blew up.
//!
//! Debris counts as an enemy target: it absorbs player missiles and wrecks
//! ships that fly into it, but is never harmed itself.

use glam::I16Vec2;

use kobo_core::commands::{CommandList, SpriteImage};
use kobo_core::constants::EXPLOSION_TTL;
use kobo_core::enums::{CollisionMask, ImageSet};
use kobo_core::types::Direction;

use super::{Actor, ActorBody, ActorKind, Behavior, Motion, TickContext};

pub struct Explosion {
    motion: Motion,
    ttl: i32,
}

impl Explosion {
    pub fn new(direction: Direction, speed: i16) -> Self {
        Self {
            motion: Motion::new(direction, speed),
            ttl: EXPLOSION_TTL,
        }
    }

    fn frame(&self) -> u8 {
        (8 - self.ttl / 2).clamp(0, 15) as u8
    }
}

impl Behavior for Explosion {
    fn update(&mut self, body: &mut ActorBody, ctx: &mut TickContext<'_>) {
        self.ttl -= 1;
        if self.ttl <= 0 {
            body.destroy();
            return;
        }
        self.motion.advance(body, ctx.playfield);
    }

    fn draw(&self, body: &ActorBody, out: &mut CommandList) {
        out.draw_sprite(body.position(), SpriteImage::new(ImageSet::Explosion, self.frame()));
    }
}

impl Actor {
    pub fn explosion(position: I16Vec2, direction: Direction, speed: i16) -> Actor {
        Actor::new(
            ActorBody::new(position, CollisionMask::ENEMY, CollisionMask::NONE),
            ActorKind::Explosion(Explosion::new(direction, speed)),
        )
    }
}

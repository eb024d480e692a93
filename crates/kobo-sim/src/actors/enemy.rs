//! Free-flying enemy ship.

use glam::I16Vec2;
use rand::Rng;

use kobo_ai::steering;
use kobo_core::commands::{CommandList, SpriteImage};
use kobo_core::constants::{ENEMY_SENSE_RANGE, ENEMY_SPEED, SCORE_ENEMY};
use kobo_core::enums::{CollisionMask, ImageSet};
use kobo_core::types::Direction;

use super::{Actor, ActorBody, ActorKind, Behavior, Contact, Motion, Spawn, TickContext};

pub struct Enemy {
    motion: Motion,
    image_set: ImageSet,
    /// Average ticks between heading decisions.
    relaxed: u32,
}

impl Enemy {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let image_set = ImageSet::ENEMIES[rng.gen_range(0..ImageSet::ENEMIES.len())];
        let direction = Direction::COMPASS[rng.gen_range(0..Direction::COMPASS.len())];
        Self {
            motion: Motion::new(direction, ENEMY_SPEED),
            image_set,
            relaxed: steering::relaxed_factor(rng),
        }
    }

    pub fn direction(&self) -> Direction {
        self.motion.direction
    }
}

impl Behavior for Enemy {
    fn update(&mut self, body: &mut ActorBody, ctx: &mut TickContext<'_>) {
        self.motion.advance(body, ctx.playfield);

        let to_player = ctx.nearest_ship(body.position(), ENEMY_SENSE_RANGE);
        self.motion.direction =
            steering::steer(self.motion.direction, self.relaxed, to_player, &mut *ctx.rng);
    }

    fn draw(&self, body: &ActorBody, out: &mut CommandList) {
        out.draw_sprite(
            body.position(),
            SpriteImage::new(self.image_set, self.motion.direction.bits()),
        );
    }

    fn on_collision(&mut self, body: &mut ActorBody, other: &Contact, ctx: &mut TickContext<'_>) {
        body.destroy();
        body.killer = other.credited_player;
        ctx.spawn(Spawn::Explosion {
            position: body.position(),
            direction: self.motion.direction,
            speed: self.motion.speed,
        });
    }

    fn score(&self) -> i32 {
        SCORE_ENEMY
    }
}

impl Actor {
    pub fn enemy<R: Rng>(position: I16Vec2, rng: &mut R) -> Actor {
        Actor::new(
            ActorBody::new(position, CollisionMask::ENEMY, CollisionMask::NONE),
            ActorKind::Enemy(Enemy::new(rng)),
        )
    }
}

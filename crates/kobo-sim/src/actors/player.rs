//! Player ship.

use glam::I16Vec2;

use kobo_core::commands::{CommandList, SpriteImage};
use kobo_core::constants::{PLAYER_MISSILE_OFFSET, PLAYER_MISSILE_SPEED, PLAYER_SPEED};
use kobo_core::enums::{Button, ButtonState, CollisionMask, ImageSet};
use kobo_core::types::Direction;

use super::{Actor, ActorBody, ActorKind, Behavior, Contact, Motion, Spawn, TickContext};

pub struct Player {
    slot: u8,
    motion: Motion,
    /// Last heading the ship moved in; missiles fly this way.
    facing: Direction,
}

impl Player {
    pub fn new(slot: u8, heading: Direction) -> Self {
        Self {
            slot,
            motion: Motion::new(Direction::Stopped, PLAYER_SPEED),
            facing: if heading.is_moving() {
                heading
            } else {
                Direction::North
            },
        }
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// Put the ship back on a start position, as at the beginning of a level.
    pub fn reset(&mut self, body: &mut ActorBody, position: I16Vec2, heading: Direction) {
        body.set_position(position);
        self.motion.direction = Direction::Stopped;
        if heading.is_moving() {
            self.facing = heading;
        }
    }
}

impl Behavior for Player {
    fn update(&mut self, body: &mut ActorBody, ctx: &mut TickContext<'_>) {
        let input = ctx.input(self.slot);
        let direction = input.player_direction();
        let fire = input.button_state(Button::A) == ButtonState::Pressed;

        self.motion.direction = direction;
        if direction.is_moving() {
            self.facing = direction;
        }
        self.motion.advance(body, ctx.playfield);

        if fire {
            let muzzle = body.position() + self.facing.to_delta(PLAYER_MISSILE_OFFSET);
            ctx.spawn(Spawn::Projectile {
                position: ctx.playfield.wrap(muzzle),
                direction: self.facing,
                speed: PLAYER_MISSILE_SPEED,
                owner: Some(self.slot),
            });
        }
    }

    fn draw(&self, body: &ActorBody, out: &mut CommandList) {
        out.draw_sprite(
            body.position(),
            SpriteImage::new(ImageSet::Player0, self.facing.bits()),
        );
    }

    fn on_collision(&mut self, body: &mut ActorBody, _other: &Contact, ctx: &mut TickContext<'_>) {
        body.destroy();
        ctx.spawn(Spawn::Explosion {
            position: body.position(),
            direction: self.motion.direction,
            speed: self.motion.speed,
        });
    }
}

impl Actor {
    pub fn player(slot: u8, position: I16Vec2, heading: Direction) -> Actor {
        Actor::new(
            ActorBody::new(
                position,
                CollisionMask::player(slot as usize),
                CollisionMask::ENEMY,
            ),
            ActorKind::Player(Player::new(slot, heading)),
        )
    }
}

//! Player input boundary and its one-byte wire form.
//!
//! Bits 0..3 carry the down state of A, B, Start and Select; bits 4..7
//! carry the direction value (0..=8).

use crate::enums::{Button, ButtonState};
use crate::types::Direction;

/// Anything that can steer a ship: a local device, an autopilot, or a
/// remote peer's proxy.
pub trait InputSource {
    fn player_direction(&self) -> Direction;
    fn button_state(&self, button: Button) -> ButtonState;
}

/// Pack the current state of `source` into one wire byte.
pub fn encode_input(source: &dyn InputSource) -> u8 {
    let buttons = Button::ALL
        .iter()
        .filter(|b| source.button_state(**b).is_down())
        .fold(0u8, |acc, b| acc | b.bit());
    buttons | (source.player_direction().bits() << 4)
}

/// Split a wire byte into (button bits, direction).
pub fn decode_input(byte: u8) -> (u8, Direction) {
    (byte & 0x0F, Direction::from_bits(byte >> 4))
}

/// Input source fed from wire bytes received from a remote client.
///
/// Edges are latched until `end_tick`, so a press and release that both
/// arrive between two simulation ticks still reads as `Pressed` once.
#[derive(Debug, Clone, Default)]
pub struct ProxyInput {
    direction: Direction,
    down: u8,
    pressed: u8,
    released: u8,
}

impl ProxyInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_byte(&mut self, byte: u8) {
        let (buttons, direction) = decode_input(byte);
        let changed = buttons ^ self.down;
        self.pressed |= changed & buttons;
        self.released |= changed & !buttons;
        self.down = buttons;
        self.direction = direction;
    }

    /// Forget edges observed during the tick that just ran.
    pub fn end_tick(&mut self) {
        self.pressed = 0;
        self.released = 0;
    }
}

impl InputSource for ProxyInput {
    fn player_direction(&self) -> Direction {
        self.direction
    }

    fn button_state(&self, button: Button) -> ButtonState {
        let bit = button.bit();
        if self.pressed & bit != 0 {
            ButtonState::Pressed
        } else if self.released & bit != 0 {
            ButtonState::Released
        } else if self.down & bit != 0 {
            ButtonState::Down
        } else {
            ButtonState::Up
        }
    }
}

/// No direction, no buttons.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleInput;

impl InputSource for IdleInput {
    fn player_direction(&self) -> Direction {
        Direction::Stopped
    }

    fn button_state(&self, _button: Button) -> ButtonState {
        ButtonState::Up
    }
}

//! Stand-ins for the controller and the display when running without a
//! window.

use glam::I16Vec2;
use tracing::info;

use kobo_core::commands::{CommandTarget, SpriteImage};
use kobo_core::enums::{Button, ButtonState, StatKind};
use kobo_core::input::InputSource;
use kobo_core::types::{CellPos, Direction};

/// Ticks spent on each heading.
const WANDER_TICKS: u64 = 45;
/// Ticks between shots.
const FIRE_TICKS: u64 = 20;

/// Deterministic pilot: sweeps through the compass and fires at a steady
/// rate. Call `advance` once per tick.
#[derive(Debug, Clone)]
pub struct AutopilotInput {
    tick: u64,
    offset: usize,
}

impl AutopilotInput {
    pub fn new(seed: u64) -> Self {
        Self {
            tick: 0,
            offset: (seed % Direction::COMPASS.len() as u64) as usize,
        }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }
}

impl InputSource for AutopilotInput {
    fn player_direction(&self) -> Direction {
        let leg = (self.tick / WANDER_TICKS) as usize;
        Direction::COMPASS[(leg + self.offset) % Direction::COMPASS.len()]
    }

    fn button_state(&self, button: Button) -> ButtonState {
        match button {
            Button::A if self.tick % FIRE_TICKS == 0 => ButtonState::Pressed,
            _ => ButtonState::Up,
        }
    }
}

/// Display stand-in that counts what it is asked to draw and logs a
/// summary every `log_every` frames.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    label: &'static str,
    log_every: u64,
    pub frames: u64,
    pub commands: u64,
    pub sprites: u64,
    pub background_edits: u64,
    pub view_offset: I16Vec2,
    pub scores: [i32; 2],
    pub lives: [i32; 2],
    frame_sprites: u64,
}

impl FrameStats {
    pub fn new(label: &'static str, log_every: u64) -> Self {
        Self {
            label,
            log_every: log_every.max(1),
            ..Self::default()
        }
    }

    /// Close the current frame.
    pub fn end_frame(&mut self) {
        self.frames += 1;
        if self.frames % self.log_every == 0 {
            info!(
                view = self.label,
                frames = self.frames,
                sprites = self.frame_sprites,
                offset_x = self.view_offset.x,
                offset_y = self.view_offset.y,
                score0 = self.scores[0],
                score1 = self.scores[1],
                lives0 = self.lives[0],
                lives1 = self.lives[1],
                "view_stats"
            );
        }
        self.frame_sprites = 0;
    }
}

impl CommandTarget for FrameStats {
    fn set_view_offset(&mut self, offset: I16Vec2) {
        self.commands += 1;
        self.view_offset = offset;
    }

    fn draw_background(&mut self) {
        self.commands += 1;
    }

    fn draw_sprite(&mut self, _position: I16Vec2, _image: SpriteImage) {
        self.commands += 1;
        self.sprites += 1;
        self.frame_sprites += 1;
    }

    fn set_player_positions(&mut self, _positions: [I16Vec2; 2]) {
        self.commands += 1;
    }

    fn set_background_cell(&mut self, _cell: CellPos, _image: SpriteImage) {
        self.commands += 1;
        self.background_edits += 1;
    }

    fn clear_background_cell(&mut self, _cell: CellPos) {
        self.commands += 1;
        self.background_edits += 1;
    }

    fn set_player_stat(&mut self, kind: StatKind, player: u8, value: i32) {
        self.commands += 1;
        let stats = match kind {
            StatKind::Score => &mut self.scores,
            StatKind::Lives => &mut self.lives,
        };
        if let Some(stat) = stats.get_mut(player as usize) {
            *stat = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use kobo_core::commands::CommandList;
    use kobo_core::input::encode_input;

    use super::*;

    #[test]
    fn test_autopilot_is_deterministic() {
        let mut a = AutopilotInput::new(3);
        let mut b = AutopilotInput::new(3);
        for _ in 0..200 {
            assert_eq!(encode_input(&a), encode_input(&b));
            a.advance();
            b.advance();
        }
    }

    #[test]
    fn test_autopilot_wanders_and_fires() {
        let mut pilot = AutopilotInput::new(0);
        assert_eq!(pilot.player_direction(), Direction::COMPASS[0]);
        assert_eq!(pilot.button_state(Button::A), ButtonState::Pressed);
        pilot.advance();
        assert_eq!(pilot.button_state(Button::A), ButtonState::Up);
        for _ in 1..WANDER_TICKS {
            pilot.advance();
        }
        assert_eq!(pilot.player_direction(), Direction::COMPASS[1]);
        assert_eq!(pilot.button_state(Button::B), ButtonState::Up);
    }

    #[test]
    fn test_frame_stats_counts() {
        let mut list = CommandList::new();
        list.set_view_offset(I16Vec2::new(10, 20));
        list.set_background_cell(CellPos::new(1, 1), SpriteImage::default());
        list.draw_background();
        list.draw_sprite(I16Vec2::ZERO, SpriteImage::default());
        list.draw_sprite(I16Vec2::ONE, SpriteImage::default());
        list.set_player_stat(StatKind::Score, 1, 250);
        list.set_player_stat(StatKind::Lives, 0, 2);
        list.set_player_stat(StatKind::Lives, 9, 7);

        let mut stats = FrameStats::new("test", 60);
        list.apply(&mut stats);
        stats.end_frame();

        assert_eq!(stats.frames, 1);
        assert_eq!(stats.commands, list.len() as u64);
        assert_eq!(stats.sprites, 2);
        assert_eq!(stats.background_edits, 1);
        assert_eq!(stats.view_offset, I16Vec2::new(10, 20));
        assert_eq!(stats.scores, [0, 250]);
        assert_eq!(stats.lives, [2, 0]);
    }
}

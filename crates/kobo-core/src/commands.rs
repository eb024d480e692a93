//! Presentation commands sent from the authoritative simulation to a view.
//!
//! A tick's worth of commands forms a frame. The local view replays the
//! list directly; the remote view receives it serialized by `kobo-net`.

use glam::I16Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::{ImageSet, StatKind};
use crate::types::CellPos;

/// Wire opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    SetViewOffset = 0,
    DrawBackground = 1,
    DrawSprite = 2,
    SetPlayerPositions = 3,
    SetBackgroundCell = 4,
    ClearBackgroundCell = 5,
    SetPlayerStat = 6,
    FrameStart = 0xFF,
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Opcode::SetViewOffset),
            1 => Ok(Opcode::DrawBackground),
            2 => Ok(Opcode::DrawSprite),
            3 => Ok(Opcode::SetPlayerPositions),
            4 => Ok(Opcode::SetBackgroundCell),
            5 => Ok(Opcode::ClearBackgroundCell),
            6 => Ok(Opcode::SetPlayerStat),
            0xFF => Ok(Opcode::FrameStart),
            other => Err(other),
        }
    }
}

/// Image reference: 4-bit group and 4-bit sub-image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteImage {
    pub group: u8,
    pub index: u8,
}

impl SpriteImage {
    pub fn new(set: ImageSet, index: u8) -> Self {
        Self {
            group: set.group(),
            index: index & 0x0F,
        }
    }

    pub fn to_byte(self) -> u8 {
        (self.group << 4) | (self.index & 0x0F)
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            group: byte >> 4,
            index: byte & 0x0F,
        }
    }
}

/// One observable change to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Opens a frame. `size` is the byte length of the whole serialized
    /// frame, this command included.
    FrameStart { size: i32 },
    /// Top-left corner of the viewport in world pixels.
    SetViewOffset { offset: I16Vec2 },
    DrawBackground,
    DrawSprite { position: I16Vec2, image: SpriteImage },
    /// Ship positions for the radar display.
    SetPlayerPositions { positions: [I16Vec2; 2] },
    SetBackgroundCell { cell: CellPos, image: SpriteImage },
    ClearBackgroundCell { cell: CellPos },
    SetPlayerStat { kind: StatKind, player: u8, value: i32 },
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::FrameStart { .. } => Opcode::FrameStart,
            Command::SetViewOffset { .. } => Opcode::SetViewOffset,
            Command::DrawBackground => Opcode::DrawBackground,
            Command::DrawSprite { .. } => Opcode::DrawSprite,
            Command::SetPlayerPositions { .. } => Opcode::SetPlayerPositions,
            Command::SetBackgroundCell { .. } => Opcode::SetBackgroundCell,
            Command::ClearBackgroundCell { .. } => Opcode::ClearBackgroundCell,
            Command::SetPlayerStat { .. } => Opcode::SetPlayerStat,
        }
    }

    /// Background edits persist on the view across frames.
    pub fn is_background_change(&self) -> bool {
        matches!(
            self,
            Command::SetBackgroundCell { .. } | Command::ClearBackgroundCell { .. }
        )
    }

    /// Replay this command against a view. `FrameStart` is framing only.
    pub fn apply(&self, target: &mut dyn CommandTarget) {
        match *self {
            Command::FrameStart { .. } => {}
            Command::SetViewOffset { offset } => target.set_view_offset(offset),
            Command::DrawBackground => target.draw_background(),
            Command::DrawSprite { position, image } => target.draw_sprite(position, image),
            Command::SetPlayerPositions { positions } => target.set_player_positions(positions),
            Command::SetBackgroundCell { cell, image } => target.set_background_cell(cell, image),
            Command::ClearBackgroundCell { cell } => target.clear_background_cell(cell),
            Command::SetPlayerStat {
                kind,
                player,
                value,
            } => target.set_player_stat(kind, player, value),
        }
    }
}

/// Receiver of replayed commands: the presentation layer's view of a frame.
pub trait CommandTarget {
    fn set_view_offset(&mut self, offset: I16Vec2);
    fn draw_background(&mut self);
    fn draw_sprite(&mut self, position: I16Vec2, image: SpriteImage);
    fn set_player_positions(&mut self, positions: [I16Vec2; 2]);
    fn set_background_cell(&mut self, cell: CellPos, image: SpriteImage);
    fn clear_background_cell(&mut self, cell: CellPos);
    fn set_player_stat(&mut self, kind: StatKind, player: u8, value: i32);
}

/// Ordered list of commands for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    commands: Vec<Command>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    pub fn as_slice(&self) -> &[Command] {
        &self.commands
    }

    pub fn set_view_offset(&mut self, offset: I16Vec2) {
        self.push(Command::SetViewOffset { offset });
    }

    pub fn draw_background(&mut self) {
        self.push(Command::DrawBackground);
    }

    pub fn draw_sprite(&mut self, position: I16Vec2, image: SpriteImage) {
        self.push(Command::DrawSprite { position, image });
    }

    pub fn set_player_positions(&mut self, positions: [I16Vec2; 2]) {
        self.push(Command::SetPlayerPositions { positions });
    }

    pub fn set_background_cell(&mut self, cell: CellPos, image: SpriteImage) {
        self.push(Command::SetBackgroundCell { cell, image });
    }

    pub fn clear_background_cell(&mut self, cell: CellPos) {
        self.push(Command::ClearBackgroundCell { cell });
    }

    pub fn set_player_stat(&mut self, kind: StatKind, player: u8, value: i32) {
        self.push(Command::SetPlayerStat {
            kind,
            player,
            value,
        });
    }

    /// The background edits of this list, in order.
    pub fn background_changes(&self) -> impl Iterator<Item = &Command> + '_ {
        self.commands.iter().filter(|c| c.is_background_change())
    }

    /// Replay every command in order.
    pub fn apply(&self, target: &mut dyn CommandTarget) {
        for command in &self.commands {
            command.apply(target);
        }
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl Extend<Command> for CommandList {
    fn extend<T: IntoIterator<Item = Command>>(&mut self, iter: T) {
        self.commands.extend(iter);
    }
}

/// Collects everything replayed into it. Used by headless views and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingTarget {
    pub commands: Vec<Command>,
}

impl CommandTarget for RecordingTarget {
    fn set_view_offset(&mut self, offset: I16Vec2) {
        self.commands.push(Command::SetViewOffset { offset });
    }

    fn draw_background(&mut self) {
        self.commands.push(Command::DrawBackground);
    }

    fn draw_sprite(&mut self, position: I16Vec2, image: SpriteImage) {
        self.commands.push(Command::DrawSprite { position, image });
    }

    fn set_player_positions(&mut self, positions: [I16Vec2; 2]) {
        self.commands.push(Command::SetPlayerPositions { positions });
    }

    fn set_background_cell(&mut self, cell: CellPos, image: SpriteImage) {
        self.commands.push(Command::SetBackgroundCell { cell, image });
    }

    fn clear_background_cell(&mut self, cell: CellPos) {
        self.commands.push(Command::ClearBackgroundCell { cell });
    }

    fn set_player_stat(&mut self, kind: StatKind, player: u8, value: i32) {
        self.commands.push(Command::SetPlayerStat {
            kind,
            player,
            value,
        });
    }
}

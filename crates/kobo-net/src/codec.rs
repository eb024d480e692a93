//! Binary encoding of presentation commands.
//!
//! Every command is an opcode byte followed by a fixed-size payload, so
//! commands carry no length of their own. Frames are length-prefixed by a
//! leading `FrameStart` whose size counts the whole frame, header included.
//! Multi-byte integers are little-endian.
//!
//! Positions use 12 bits per axis packed into three bytes:
//!
//! ```text
//! byte 0: x[7:0]
//! byte 1: x[11:8] << 4 | y[3:0]
//! byte 2: y[11:4]
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use glam::I16Vec2;

use kobo_core::commands::{Command, CommandList, Opcode, SpriteImage};
use kobo_core::enums::StatKind;
use kobo_core::types::CellPos;

use crate::error::NetError;

/// Bytes taken by a `FrameStart` command.
pub const FRAME_HEADER_LEN: usize = 5;

/// Largest frame a receiver accepts. A full redraw of every background cell
/// is 64 KiB, so anything past this is a corrupt header.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Payload size following each opcode.
pub const fn payload_len(opcode: Opcode) -> usize {
    match opcode {
        Opcode::SetViewOffset => 3,
        Opcode::DrawBackground => 0,
        Opcode::DrawSprite => 4,
        Opcode::SetPlayerPositions => 6,
        Opcode::SetBackgroundCell => 3,
        Opcode::ClearBackgroundCell => 2,
        Opcode::SetPlayerStat => 5,
        Opcode::FrameStart => 4,
    }
}

pub fn pack_u12(position: I16Vec2) -> [u8; 3] {
    let x = position.x as u16 & 0x0FFF;
    let y = position.y as u16 & 0x0FFF;
    [
        (x & 0xFF) as u8,
        ((x >> 4) & 0xF0) as u8 | (y & 0x0F) as u8,
        (y >> 4) as u8,
    ]
}

pub fn unpack_u12(bytes: [u8; 3]) -> I16Vec2 {
    let x = bytes[0] as u16 | ((bytes[1] as u16 & 0xF0) << 4);
    let y = (bytes[1] as u16 & 0x0F) | ((bytes[2] as u16) << 4);
    I16Vec2::new(x as i16, y as i16)
}

fn stat_byte(kind: StatKind, player: u8) -> u8 {
    ((kind as u8) << 4) | (player & 0x0F)
}

/// Append one command to `out`.
pub fn encode_command(command: &Command, out: &mut BytesMut) {
    out.put_u8(command.opcode() as u8);
    match *command {
        Command::FrameStart { size } => out.put_i32_le(size),
        Command::SetViewOffset { offset } => out.put_slice(&pack_u12(offset)),
        Command::DrawBackground => {}
        Command::DrawSprite { position, image } => {
            out.put_slice(&pack_u12(position));
            out.put_u8(image.to_byte());
        }
        Command::SetPlayerPositions { positions } => {
            out.put_slice(&pack_u12(positions[0]));
            out.put_slice(&pack_u12(positions[1]));
        }
        Command::SetBackgroundCell { cell, image } => {
            out.put_u8(cell.x);
            out.put_u8(cell.y);
            out.put_u8(image.to_byte());
        }
        Command::ClearBackgroundCell { cell } => {
            out.put_u8(cell.x);
            out.put_u8(cell.y);
        }
        Command::SetPlayerStat {
            kind,
            player,
            value,
        } => {
            out.put_u8(stat_byte(kind, player));
            out.put_i32_le(value);
        }
    }
}

fn get_u12(buf: &mut &[u8]) -> I16Vec2 {
    let mut bytes = [0u8; 3];
    buf.copy_to_slice(&mut bytes);
    unpack_u12(bytes)
}

/// Decode the payload of `opcode` from the front of `buf`.
///
/// Desync offsets in the returned error are relative to the opcode byte.
pub fn decode_payload(opcode: Opcode, buf: &mut &[u8]) -> Result<Command, NetError> {
    if buf.remaining() < payload_len(opcode) {
        return Err(NetError::Truncated);
    }
    let command = match opcode {
        Opcode::FrameStart => Command::FrameStart {
            size: buf.get_i32_le(),
        },
        Opcode::SetViewOffset => Command::SetViewOffset {
            offset: get_u12(buf),
        },
        Opcode::DrawBackground => Command::DrawBackground,
        Opcode::DrawSprite => Command::DrawSprite {
            position: get_u12(buf),
            image: SpriteImage::from_byte(buf.get_u8()),
        },
        Opcode::SetPlayerPositions => Command::SetPlayerPositions {
            positions: [get_u12(buf), get_u12(buf)],
        },
        Opcode::SetBackgroundCell => Command::SetBackgroundCell {
            cell: CellPos::new(buf.get_u8(), buf.get_u8()),
            image: SpriteImage::from_byte(buf.get_u8()),
        },
        Opcode::ClearBackgroundCell => Command::ClearBackgroundCell {
            cell: CellPos::new(buf.get_u8(), buf.get_u8()),
        },
        Opcode::SetPlayerStat => {
            let stat = buf.get_u8();
            let value = buf.get_i32_le();
            let kind = StatKind::from_nibble(stat >> 4).ok_or(NetError::Desync {
                opcode: Opcode::SetPlayerStat as u8,
                offset: 1,
            })?;
            Command::SetPlayerStat {
                kind,
                player: stat & 0x0F,
                value,
            }
        }
    };
    Ok(command)
}

/// Decode one command, opcode included, from the front of `buf`.
pub fn decode_command(buf: &mut &[u8]) -> Result<Command, NetError> {
    if !buf.has_remaining() {
        return Err(NetError::Truncated);
    }
    let byte = buf.get_u8();
    let opcode =
        Opcode::try_from(byte).map_err(|opcode| NetError::Desync { opcode, offset: 0 })?;
    decode_payload(opcode, buf)
}

/// Serialize a frame: a `FrameStart` carrying the total length, then every
/// command of `commands` in order.
pub fn encode_frame(commands: &CommandList) -> Bytes {
    let mut out = BytesMut::with_capacity(FRAME_HEADER_LEN + commands.len() * 4);
    encode_command(&Command::FrameStart { size: 0 }, &mut out);
    for command in commands {
        debug_assert!(
            !matches!(command, Command::FrameStart { .. }),
            "frame start inside a command list"
        );
        encode_command(command, &mut out);
    }
    let size = out.len() as i32;
    out[1..FRAME_HEADER_LEN].copy_from_slice(&size.to_le_bytes());
    out.freeze()
}

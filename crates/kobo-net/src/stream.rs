//! Frame reassembly on the receiving side.
//!
//! Bytes arrive in arbitrary chunks. They are buffered until a whole frame is
//! present, and only then parsed, so a frame is never partly applied. Parsed
//! commands accumulate until the caller runs them; the first complete frame
//! after a run replaces the list instead of appending to it.

use bytes::{Buf, BytesMut};
use tracing::trace;

use kobo_core::commands::{Command, CommandList, CommandTarget, Opcode};

use crate::codec::{decode_command, FRAME_HEADER_LEN, MAX_FRAME_LEN};
use crate::error::NetError;

/// Result of feeding bytes to a [`CommandStream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStatus {
    /// Frames parsed by this call.
    pub frames_completed: usize,
    /// Bytes of an incomplete frame are buffered.
    pub awaiting: bool,
}

#[derive(Debug, Default)]
pub struct CommandStream {
    buffer: BytesMut,
    commands: CommandList,
    has_run: bool,
    /// Stream offset of the first buffered byte.
    consumed: usize,
}

impl CommandStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands parsed and not yet replaced by a newer frame.
    pub fn commands(&self) -> &CommandList {
        &self.commands
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Append received bytes and parse every frame they complete.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<FeedStatus, NetError> {
        self.buffer.extend_from_slice(chunk);
        let mut status = FeedStatus::default();

        while !self.buffer.is_empty() {
            let first = self.buffer[0];
            if first != Opcode::FrameStart as u8 {
                return Err(NetError::Desync {
                    opcode: first,
                    offset: self.consumed,
                });
            }
            if self.buffer.len() < FRAME_HEADER_LEN {
                status.awaiting = true;
                break;
            }
            let mut header = &self.buffer[1..FRAME_HEADER_LEN];
            let size = header.get_i32_le();
            let size = match usize::try_from(size) {
                Ok(size) if (FRAME_HEADER_LEN..=MAX_FRAME_LEN).contains(&size) => size,
                _ => {
                    return Err(NetError::Desync {
                        opcode: first,
                        offset: self.consumed,
                    })
                }
            };
            if self.buffer.len() < size {
                status.awaiting = true;
                break;
            }

            let frame = self.buffer.split_to(size);
            let parsed = parse_body(&frame[FRAME_HEADER_LEN..])
                .map_err(|err| err.at_offset(self.consumed + FRAME_HEADER_LEN))?;
            self.consumed += size;

            if self.has_run {
                self.commands.clear();
                self.has_run = false;
            }
            self.commands.extend(parsed);
            status.frames_completed += 1;
            trace!(size, commands = self.commands.len(), "frame_received");
        }
        Ok(status)
    }

    /// Replay the buffered commands into `target`. Returns how many ran.
    pub fn run(&mut self, target: &mut dyn CommandTarget) -> usize {
        self.commands.apply(target);
        self.has_run = true;
        self.commands.len()
    }
}

/// Parse the commands following a frame header. Offsets in errors are
/// relative to the start of `body`.
fn parse_body(body: &[u8]) -> Result<Vec<Command>, NetError> {
    let mut commands = Vec::new();
    let mut cursor = body;
    while !cursor.is_empty() {
        let offset = body.len() - cursor.len();
        let command = decode_command(&mut cursor).map_err(|err| err.at_offset(offset))?;
        if let Command::FrameStart { .. } = command {
            return Err(NetError::Desync {
                opcode: Opcode::FrameStart as u8,
                offset,
            });
        }
        commands.push(command);
    }
    Ok(commands)
}

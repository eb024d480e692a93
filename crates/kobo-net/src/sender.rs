//! Non-blocking frame writer.
//!
//! At most one frame is in flight. If the socket cannot take a whole frame,
//! the rest is kept and flushed before anything new is written. A frame
//! offered while an earlier one is still pending is dropped: the next tick
//! sends the current state anyway.

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};

use bytes::{Buf, Bytes};
use tracing::trace;

use crate::error::NetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written in full.
    Sent,
    /// Partly written; the rest goes out on later calls.
    Partial,
    /// Not written because an earlier frame was still pending.
    Dropped,
}

pub struct FrameSender {
    stream: TcpStream,
    pending: Option<Bytes>,
}

impl FrameSender {
    /// Switches `stream` to non-blocking mode.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            stream,
            pending: None,
        })
    }

    /// Close both directions so the peer and our own reader see EOF.
    pub fn shutdown(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn send_frame(&mut self, frame: Bytes) -> Result<SendOutcome, NetError> {
        self.flush_pending()?;
        if self.pending.is_some() {
            trace!(len = frame.len(), "frame_dropped");
            return Ok(SendOutcome::Dropped);
        }
        let mut frame = frame;
        write_some(&mut self.stream, &mut frame)?;
        if frame.is_empty() {
            Ok(SendOutcome::Sent)
        } else {
            self.pending = Some(frame);
            Ok(SendOutcome::Partial)
        }
    }

    /// Push out as much of the pending frame as the socket accepts.
    pub fn flush_pending(&mut self) -> Result<(), NetError> {
        if let Some(pending) = self.pending.as_mut() {
            write_some(&mut self.stream, pending)?;
            if pending.is_empty() {
                self.pending = None;
            }
        }
        Ok(())
    }
}

fn write_some(stream: &mut TcpStream, data: &mut Bytes) -> Result<(), NetError> {
    while !data.is_empty() {
        match stream.write(&data[..]) {
            Ok(0) => return Err(NetError::Disconnected),
            Ok(n) => data.advance(n),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(NetError::Io(err)),
        }
    }
    Ok(())
}

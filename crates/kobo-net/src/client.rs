//! Remote side of a session: sends input, replays the frames it receives.

use std::net::TcpStream;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{info, warn};

use kobo_core::commands::CommandTarget;
use kobo_core::input::{encode_input, InputSource};

use crate::config::NetConfig;
use crate::error::NetError;
use crate::handshake::{expect_greeting, send_greeting};
use crate::reader::{ReaderEvent, ReaderTask};
use crate::sender::FrameSender;
use crate::stream::CommandStream;

pub struct GameClient {
    reader: ReaderTask,
    sender: FrameSender,
    stream: CommandStream,
    frames_received: u64,
}

impl GameClient {
    /// Connect to a server at `addr` (`host:port`) and exchange greetings.
    pub fn connect(addr: &str, config: &NetConfig) -> Result<Self, NetError> {
        let mut socket = TcpStream::connect(addr)?;
        socket.set_nodelay(true)?;
        send_greeting(&mut socket)?;
        expect_greeting(&mut socket, config.greeting_timeout())?;

        let reader =
            ReaderTask::spawn("kobo-client-reader", socket.try_clone()?, config.idle_sleep())?;
        let sender = FrameSender::new(socket)?;
        info!(addr, "client_connected");
        Ok(Self {
            reader,
            sender,
            stream: CommandStream::new(),
            frames_received: 0,
        })
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Send this tick's input byte. A byte that cannot be written yet is
    /// dropped; the next tick sends the current state.
    pub fn send_input(&mut self, input: &dyn InputSource) -> Result<(), NetError> {
        let byte = encode_input(input);
        self.sender.send_frame(Bytes::copy_from_slice(&[byte]))?;
        Ok(())
    }

    /// Consume everything received so far. If it completed at least one
    /// frame, replay the buffered commands into `target` and return how many
    /// ran; otherwise return 0.
    pub fn poll(&mut self, target: &mut dyn CommandTarget) -> Result<usize, NetError> {
        let mut completed = 0;
        while let Some(event) = self.reader.try_recv() {
            completed += self.handle(event)?;
        }
        Ok(self.replay(completed, target))
    }

    /// Like `poll`, but wait up to `timeout` for a frame to complete.
    pub fn wait_frame(
        &mut self,
        target: &mut dyn CommandTarget,
        timeout: Duration,
    ) -> Result<usize, NetError> {
        let deadline = Instant::now() + timeout;
        let mut completed = 0;
        while completed == 0 {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.reader.recv_timeout(deadline - now) {
                Some(event) => completed += self.handle(event)?,
                None => break,
            }
        }
        while let Some(event) = self.reader.try_recv() {
            completed += self.handle(event)?;
        }
        Ok(self.replay(completed, target))
    }

    fn handle(&mut self, event: ReaderEvent) -> Result<usize, NetError> {
        match event {
            ReaderEvent::Data(bytes) => {
                let status = self.stream.feed(&bytes).inspect_err(|err| {
                    warn!(error = %err, "command_stream_desync");
                })?;
                Ok(status.frames_completed)
            }
            ReaderEvent::Closed => Err(NetError::Disconnected),
            ReaderEvent::Failed(err) => Err(NetError::Io(err)),
        }
    }

    fn replay(&mut self, completed: usize, target: &mut dyn CommandTarget) -> usize {
        if completed == 0 {
            return 0;
        }
        self.frames_received += completed as u64;
        self.stream.run(target)
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.sender.shutdown();
    }
}

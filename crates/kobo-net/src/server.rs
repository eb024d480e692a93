//! Authoritative side of a session.
//!
//! The server owns the simulation. Slot 0 is driven by a local input source.
//! Slot 1, when a client is connected, is driven by the input bytes the
//! client sends. After every tick the client's view is encoded and written
//! without blocking.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use kobo_core::commands::CommandList;
use kobo_core::enums::RoundPhase;
use kobo_core::input::{InputSource, ProxyInput};
use kobo_sim::engine::TickSummary;
use kobo_sim::SimulationEngine;

use crate::codec::encode_frame;
use crate::config::NetConfig;
use crate::error::NetError;
use crate::handshake::{expect_greeting, send_greeting};
use crate::reader::{ReaderEvent, ReaderTask};
use crate::sender::{FrameSender, SendOutcome};

/// Poll interval while waiting for a client with a deadline.
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed its end.
    PeerClosed,
    /// The connection failed.
    Error(String),
    /// The server was dropped or closed by its owner.
    Shutdown,
}

pub type CloseHandler = Box<dyn FnOnce(&CloseReason) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    GameOver,
}

struct RemotePeer {
    addr: SocketAddr,
    reader: ReaderTask,
    sender: FrameSender,
    input: ProxyInput,
}

pub struct GameServer {
    engine: SimulationEngine,
    remote: Option<RemotePeer>,
    close_handler: Option<CloseHandler>,
    /// Scratch list for the remote view.
    view: CommandList,
    /// Background edits from frames the client never received.
    carried: CommandList,
    last_summary: Option<TickSummary>,
}

impl GameServer {
    /// A session with no remote player.
    pub fn local(engine: SimulationEngine) -> Self {
        Self {
            engine,
            remote: None,
            close_handler: None,
            view: CommandList::new(),
            carried: CommandList::new(),
            last_summary: None,
        }
    }

    pub fn bind(config: &NetConfig) -> Result<TcpListener, NetError> {
        let listener = TcpListener::bind(config.listen_addr())?;
        info!(addr = %listener.local_addr()?, "server_listening");
        Ok(listener)
    }

    /// Wait for one client, greet it and start a session with it in slot 1.
    pub fn accept(
        listener: &TcpListener,
        engine: SimulationEngine,
        config: &NetConfig,
    ) -> Result<Self, NetError> {
        let (mut stream, addr) = accept_with_timeout(listener, config.accept_timeout())?;
        stream.set_nodelay(true)?;
        send_greeting(&mut stream)?;
        expect_greeting(&mut stream, config.greeting_timeout())?;

        let reader =
            ReaderTask::spawn("kobo-server-reader", stream.try_clone()?, config.idle_sleep())?;
        let sender = FrameSender::new(stream)?;
        info!(peer = %addr, "client_connected");

        let mut server = Self::local(engine);
        // The level was built before the client joined.
        server.carried = server.engine.world().background_changes().clone();
        server.remote = Some(RemotePeer {
            addr,
            reader,
            sender,
            input: ProxyInput::new(),
        });
        Ok(server)
    }

    /// Register a callback run once when the session closes.
    pub fn on_close<F>(&mut self, handler: F)
    where
        F: FnOnce(&CloseReason) + Send + 'static,
    {
        self.close_handler = Some(Box::new(handler));
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote.as_ref().map(|peer| peer.addr)
    }

    pub fn last_summary(&self) -> Option<&TickSummary> {
        self.last_summary.as_ref()
    }

    /// Run one tick: apply received input, step the simulation and send the
    /// client its view. A lost connection closes the session and is
    /// returned as the error.
    pub fn tick(&mut self, local_input: &dyn InputSource) -> Result<SessionStatus, NetError> {
        if let Err(err) = self.drain_remote_input() {
            self.close_for(&err);
            return Err(err);
        }

        let summary = match self.remote.as_ref() {
            Some(peer) => self.engine.tick(&[local_input, &peer.input]),
            None => self.engine.tick(&[local_input]),
        };
        self.last_summary = Some(summary);

        if let Err(err) = self.send_remote_view() {
            self.close_for(&err);
            return Err(err);
        }

        Ok(match self.engine.phase() {
            RoundPhase::GameOver => SessionStatus::GameOver,
            _ => SessionStatus::Running,
        })
    }

    /// Append slot 0's view of the current tick to `out`.
    pub fn build_local_view(&self, out: &mut CommandList) {
        self.engine.build_view(0, out);
    }

    /// End the session. The close handler runs on the first call only.
    pub fn close(&mut self, reason: CloseReason) {
        if let Some(peer) = self.remote.take() {
            peer.sender.shutdown();
            drop(peer);
            info!(reason = ?reason, "session_closed");
        }
        if let Some(handler) = self.close_handler.take() {
            handler(&reason);
        }
    }

    fn close_for(&mut self, err: &NetError) {
        let reason = match err {
            NetError::Disconnected => CloseReason::PeerClosed,
            other => CloseReason::Error(other.to_string()),
        };
        warn!(error = %err, "remote_connection_lost");
        self.close(reason);
    }

    fn drain_remote_input(&mut self) -> Result<(), NetError> {
        let Some(peer) = self.remote.as_mut() else {
            return Ok(());
        };
        while let Some(event) = peer.reader.try_recv() {
            match event {
                ReaderEvent::Data(bytes) => {
                    for byte in bytes.iter() {
                        peer.input.apply_byte(*byte);
                    }
                }
                ReaderEvent::Closed => return Err(NetError::Disconnected),
                ReaderEvent::Failed(err) => return Err(NetError::Io(err)),
            }
        }
        Ok(())
    }

    fn send_remote_view(&mut self) -> Result<(), NetError> {
        let Some(peer) = self.remote.as_mut() else {
            return Ok(());
        };
        peer.input.end_tick();

        self.view.clear();
        self.engine.build_view_with(1, &self.carried, &mut self.view);
        let frame = encode_frame(&self.view);
        let len = frame.len();
        match peer.sender.send_frame(frame)? {
            SendOutcome::Dropped => {
                let changes = self.engine.world().background_changes();
                self.carried.extend(changes.iter().copied());
                debug!(len, carried = self.carried.len(), "remote_frame_dropped");
            }
            SendOutcome::Sent | SendOutcome::Partial => self.carried.clear(),
        }
        Ok(())
    }
}

impl Drop for GameServer {
    fn drop(&mut self) {
        self.close(CloseReason::Shutdown);
    }
}

fn accept_with_timeout(
    listener: &TcpListener,
    timeout: Option<Duration>,
) -> Result<(TcpStream, SocketAddr), NetError> {
    let Some(timeout) = timeout else {
        listener.set_nonblocking(false)?;
        let (stream, addr) = listener.accept()?;
        return Ok((stream, addr));
    };

    listener.set_nonblocking(true)?;
    let deadline = Instant::now() + timeout;
    let accepted = loop {
        match listener.accept() {
            Ok(pair) => break Ok(pair),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    break Err(NetError::Io(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "no client connected before the accept timeout",
                    )));
                }
                thread::sleep(ACCEPT_POLL);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => break Err(NetError::Io(err)),
        }
    };
    listener.set_nonblocking(false)?;
    let (stream, addr) = accepted?;
    stream.set_nonblocking(false)?;
    Ok((stream, addr))
}

//! Background socket reader.
//!
//! One thread per connection reads whatever the peer sends and forwards it to
//! the owning session over a channel. The session drains the channel once per
//! tick, so the simulation never waits on the socket. Dropping the task
//! closes its shutdown channel, which the thread notices at its next idle
//! point, and then joins it.

use std::io::{self, Read};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

const READ_CHUNK: usize = 4096;

#[derive(Debug)]
pub enum ReaderEvent {
    Data(Bytes),
    /// The peer closed its end.
    Closed,
    Failed(io::Error),
}

pub struct ReaderTask {
    handle: Option<JoinHandle<()>>,
    shutdown: Option<Sender<()>>,
    events: Receiver<ReaderEvent>,
}

impl ReaderTask {
    /// Start reading `stream` on a thread called `name`. `idle` bounds how
    /// long the thread waits for data before checking for shutdown.
    pub fn spawn(name: &str, mut stream: TcpStream, idle: Duration) -> io::Result<Self> {
        stream.set_read_timeout(Some(idle))?;
        let (event_tx, events) = mpsc::channel();
        let (shutdown, shutdown_rx) = mpsc::channel::<()>();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                read_loop(&mut stream, idle, &shutdown_rx, &event_tx);
                debug!(thread = %thread_name, "reader_stopped");
            })?;
        Ok(Self {
            handle: Some(handle),
            shutdown: Some(shutdown),
            events,
        })
    }

    /// Next event if one is ready.
    pub fn try_recv(&self) -> Option<ReaderEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(ReaderEvent::Closed),
        }
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ReaderEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(ReaderEvent::Closed),
        }
    }
}

impl Drop for ReaderTask {
    fn drop(&mut self) {
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("reader_thread_panicked");
            }
        }
    }
}

fn read_loop(
    stream: &mut TcpStream,
    idle: Duration,
    shutdown: &Receiver<()>,
    events: &Sender<ReaderEvent>,
) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match shutdown.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => return,
        }
        match stream.read(&mut buf) {
            Ok(0) => {
                let _ = events.send(ReaderEvent::Closed);
                return;
            }
            Ok(n) => {
                if events
                    .send(ReaderEvent::Data(Bytes::copy_from_slice(&buf[..n])))
                    .is_err()
                {
                    return;
                }
            }
            // The socket may be shared with a non-blocking writer, in which
            // case reads return at once instead of honouring the timeout.
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                thread::sleep(idle);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                let _ = events.send(ReaderEvent::Failed(err));
                return;
            }
        }
    }
}

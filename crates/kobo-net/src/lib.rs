//! Networking for kobo: the binary command protocol and the two ends of a
//! session.
//!
//! The server runs the simulation and streams one frame of commands per tick
//! to the client. The client sends one input byte per tick back. Each side
//! reads its socket on a background thread and hands the bytes to the main
//! loop over a channel, so the loop never blocks on the network.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod handshake;
pub mod reader;
pub mod sender;
pub mod server;
pub mod stream;

pub use client::GameClient;
pub use config::NetConfig;
pub use error::NetError;
pub use server::GameServer;

#[cfg(test)]
mod tests;

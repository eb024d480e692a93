//! Connection greeting. Both ends send the same three bytes on connect and
//! refuse the session if the peer's differ.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use tracing::debug;

use kobo_core::constants::GREETING;

use crate::error::NetError;

pub fn send_greeting<W: Write>(stream: &mut W) -> Result<(), NetError> {
    stream.write_all(GREETING)?;
    stream.flush()?;
    Ok(())
}

/// Block until the peer's greeting arrives or `timeout` passes.
pub fn expect_greeting(stream: &mut TcpStream, timeout: Duration) -> Result<(), NetError> {
    stream.set_read_timeout(Some(timeout))?;
    let result = read_greeting(stream);
    stream.set_read_timeout(None)?;
    let received = result?;
    check_greeting(&received)?;
    debug!("greeting_accepted");
    Ok(())
}

fn read_greeting<R: Read>(stream: &mut R) -> Result<[u8; 3], NetError> {
    let mut received = [0u8; 3];
    match stream.read_exact(&mut received) {
        Ok(()) => Ok(received),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(NetError::Disconnected),
        Err(err) => Err(NetError::Io(err)),
    }
}

/// Greetings compare without regard to ASCII case.
pub fn check_greeting(received: &[u8]) -> Result<(), NetError> {
    if received.eq_ignore_ascii_case(GREETING) {
        Ok(())
    } else {
        Err(NetError::Handshake(received.to_vec()))
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("socket error")]
    Io(#[from] std::io::Error),
    #[error("unexpected greeting {0:?}")]
    Handshake(Vec<u8>),
    #[error("unknown opcode {opcode:#04x} at byte {offset}")]
    Desync { opcode: u8, offset: usize },
    #[error("peer closed the connection")]
    Disconnected,
    #[error("command cut off by the end of its frame")]
    Truncated,
}

impl NetError {
    /// Rebase a desync offset that was relative to a command onto the stream.
    pub(crate) fn at_offset(self, base: usize) -> Self {
        match self {
            NetError::Desync { opcode, offset } => NetError::Desync {
                opcode,
                offset: base + offset,
            },
            other => other,
        }
    }

    /// Whether the connection is unusable after this error.
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, NetError::Io(_) | NetError::Disconnected)
    }
}

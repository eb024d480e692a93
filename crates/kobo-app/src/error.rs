use thiserror::Error;

use kobo_core::level::LevelError;
use kobo_net::NetError;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not load levels: {0}")]
    Levels(#[from] LevelError),
    #[error("network: {0}")]
    Net(#[from] NetError),
    #[error("output: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Process exit status for this failure.
    pub fn exit_status(&self) -> u8 {
        match self {
            AppError::Config(ConfigError::Usage(_)) => 2,
            _ => 1,
        }
    }
}

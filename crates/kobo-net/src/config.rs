use std::time::Duration;

use serde::{Deserialize, Serialize};

use kobo_core::constants::{DEFAULT_PORT, GREETING_TIMEOUT_MS, READER_IDLE_SLEEP_MS};

/// Socket settings shared by server and client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Address the server listens on.
    pub bind_address: String,
    pub port: u16,
    /// How long a reader thread waits when no data is ready.
    pub idle_sleep_ms: u64,
    /// How long to wait for the peer's greeting.
    pub greeting_timeout_ms: u64,
    /// Give up waiting for a client after this long. Waits forever if unset.
    pub accept_timeout_ms: Option<u64>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            idle_sleep_ms: READER_IDLE_SLEEP_MS,
            greeting_timeout_ms: GREETING_TIMEOUT_MS,
            accept_timeout_ms: None,
        }
    }
}

impl NetConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms.max(1))
    }

    pub fn greeting_timeout(&self) -> Duration {
        Duration::from_millis(self.greeting_timeout_ms.max(1))
    }

    pub fn accept_timeout(&self) -> Option<Duration> {
        self.accept_timeout_ms.map(Duration::from_millis)
    }
}

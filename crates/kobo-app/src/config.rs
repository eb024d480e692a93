//! Application configuration.
//!
//! Layers, lowest to highest priority: built-in defaults, an optional JSON
//! file, `KOBO_*` environment variables, command-line flags. A bad
//! environment value is logged and ignored; a bad file is an error.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use kobo_core::constants::TICK_RATE;
use kobo_net::NetConfig;
use kobo_sim::engine::SimConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Usage(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sim: SimConfig,
    pub net: NetConfig,
    /// Server the client connects to.
    pub host: String,
    /// Level file. The built-in levels are used when unset.
    pub levels_path: Option<PathBuf>,
    pub tick_rate: u32,
    /// Stop after this many ticks. Runs until game over or disconnect when
    /// unset.
    pub ticks: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            net: NetConfig::default(),
            host: "127.0.0.1".to_string(),
            levels_path: None,
            tick_rate: TICK_RATE,
            ticks: None,
        }
    }
}

/// Values given on the command line. `None` leaves the setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub host: Option<String>,
    pub two_player: bool,
    pub seed: Option<u64>,
    pub levels: Option<PathBuf>,
    pub level: Option<usize>,
    pub ticks: Option<u64>,
}

impl AppConfig {
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply `KOBO_*` overrides read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = parse_env(&lookup, "KOBO_PORT") {
            self.net.port = port;
        }
        if let Some(bind) = lookup("KOBO_BIND") {
            self.net.bind_address = bind;
        }
        if let Some(host) = lookup("KOBO_HOST") {
            self.host = host;
        }
        if let Some(seed) = parse_env(&lookup, "KOBO_SEED") {
            self.sim.seed = seed;
        }
        if let Some(raw) = lookup("KOBO_TWO_PLAYER") {
            match parse_flag(&raw) {
                Some(flag) => self.sim.two_player = flag,
                None => warn!(var = "KOBO_TWO_PLAYER", value = %raw, "ignoring_invalid_env_value"),
            }
        }
        if let Some(path) = lookup("KOBO_LEVELS") {
            self.levels_path = Some(PathBuf::from(path));
        }
        if let Some(level) = parse_env(&lookup, "KOBO_LEVEL") {
            self.sim.start_level = level;
        }
        if let Some(rate) = parse_env::<u32, _>(&lookup, "KOBO_TICK_RATE") {
            if rate > 0 {
                self.tick_rate = rate;
            } else {
                warn!(var = "KOBO_TICK_RATE", value = rate, "ignoring_invalid_env_value");
            }
        }
        if let Some(ticks) = parse_env(&lookup, "KOBO_TICKS") {
            self.ticks = Some(ticks);
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(port) = overrides.port {
            self.net.port = port;
        }
        if let Some(bind) = &overrides.bind {
            self.net.bind_address = bind.clone();
        }
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if overrides.two_player {
            self.sim.two_player = true;
        }
        if let Some(seed) = overrides.seed {
            self.sim.seed = seed;
        }
        if let Some(levels) = &overrides.levels {
            self.levels_path = Some(levels.clone());
        }
        if let Some(level) = overrides.level {
            self.sim.start_level = level;
        }
        if let Some(ticks) = overrides.ticks {
            self.ticks = Some(ticks);
        }
    }

    /// `host:port` for the client.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.net.port)
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(var = key, value = %raw, error = %err, "ignoring_invalid_env_value");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kobo.json");
        std::fs::write(&path, r#"{ "host": "10.0.0.2", "sim": { "seed": 9 } }"#).unwrap();

        let config = AppConfig::load_file(&path).unwrap();
        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.sim.seed, 9);
        assert_eq!(config.sim.lives, SimConfig::default().lives);
        assert_eq!(config.net, NetConfig::default());
        assert_eq!(config.tick_rate, TICK_RATE);
    }

    #[test]
    fn test_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AppConfig::load_file(&dir.path().join("none.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ port: }").unwrap();
        assert!(matches!(
            AppConfig::load_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env_with(env(&[
            ("KOBO_PORT", "4000"),
            ("KOBO_SEED", "77"),
            ("KOBO_TWO_PLAYER", "yes"),
            ("KOBO_LEVEL", "3"),
            ("KOBO_HOST", "example.test"),
        ]));
        assert_eq!(config.net.port, 4000);
        assert_eq!(config.sim.seed, 77);
        assert!(config.sim.two_player);
        assert_eq!(config.sim.start_level, 3);
        assert_eq!(config.server_addr(), "example.test:4000");
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_with(env(&[
            ("KOBO_PORT", "99999"),
            ("KOBO_TWO_PLAYER", "maybe"),
            ("KOBO_TICK_RATE", "0"),
        ]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_flags_beat_env() {
        let mut config = AppConfig::default();
        config.apply_env_with(env(&[("KOBO_PORT", "4000"), ("KOBO_TICKS", "10")]));
        config.apply_overrides(&Overrides {
            port: Some(5000),
            seed: Some(1),
            ..Overrides::default()
        });
        assert_eq!(config.net.port, 5000);
        assert_eq!(config.sim.seed, 1);
        assert_eq!(config.ticks, Some(10));
    }
}

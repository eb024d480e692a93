//! The `kobo` binary's library half.
//!
//! Wires the simulation and network crates into the server and client roles,
//! with headless stand-ins for the display and the controller.

pub mod cli;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod headless;

pub use error::AppError;
pub use kobo_core as core;

use std::io::{self, Write};

use tracing::info;

use kobo_core::level::LevelSet;

use crate::cli::{Invocation, Mode};
use crate::config::AppConfig;

/// Run a parsed invocation to completion.
pub fn run(invocation: Invocation) -> Result<(), AppError> {
    let mut config = match invocation.config_path.as_deref() {
        Some(path) => AppConfig::load_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_env();
    config.apply_overrides(&invocation.overrides);
    let levels = load_levels(&config)?;

    match invocation.mode {
        Mode::Server => {
            let report = game_loop::run_server(&config, levels)?;
            info!(ticks = report.ticks, frames = report.frames, "server_finished");
        }
        Mode::Client => {
            let report = game_loop::run_client(&config)?;
            info!(ticks = report.ticks, frames = report.frames, "client_finished");
        }
        Mode::Levels => print_levels(&levels, &mut io::stdout().lock())?,
        Mode::Help => println!("{}", cli::usage_text()),
    }
    Ok(())
}

pub fn load_levels(config: &AppConfig) -> Result<LevelSet, AppError> {
    let levels = match config.levels_path.as_deref() {
        Some(path) => LevelSet::load(path)?,
        None => LevelSet::builtin()?,
    };
    info!(count = levels.len(), "levels_loaded");
    Ok(levels)
}

/// One line per level.
pub fn print_levels<W: Write>(levels: &LevelSet, out: &mut W) -> io::Result<()> {
    for (index, level) in levels.iter().enumerate() {
        writeln!(
            out,
            "level {index:2}: {} starts, {} fortresses, {} enemies",
            level.player_starts.len(),
            level.fortresses.len(),
            level.enemies
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_levels_one_line_each() {
        let levels = LevelSet::builtin().unwrap();
        let mut out = Vec::new();
        print_levels(&levels, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), levels.len());
        assert!(text.starts_with("level  0: "));
    }

    #[test]
    fn test_levels_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.json");
        std::fs::write(
            &path,
            r#"{ "levels": [ {
                "player_starts": [ { "location": [64, 64], "heading": "East" } ],
                "fortresses": [ { "origin": [512, 512], "size": [80, 48] } ],
                "enemies": 2
            } ] }"#,
        )
        .unwrap();
        let config = AppConfig {
            levels_path: Some(path),
            ..AppConfig::default()
        };
        let levels = load_levels(&config).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels.get(0).enemies, 2);
    }
}

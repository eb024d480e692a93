//! Level descriptions: where ships start and where fortresses stand.
//!
//! The standard level set ships embedded in the binary as JSON. Custom sets
//! use the same format and can be loaded from disk.

use std::path::Path;

use glam::I16Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Direction, Rect};

const BUILTIN_LEVELS: &str = include_str!("../assets/levels.json");

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("level data is not valid JSON")]
    Parse(#[from] serde_json::Error),
    #[error("level set contains no levels")]
    Empty,
    #[error("level {level} has no player start positions")]
    NoSpawnPoints { level: usize },
    #[error("level {level} fortress {fortress} has an empty area")]
    EmptyFortress { level: usize, fortress: usize },
}

/// A place a ship can appear, and the way it faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub location: I16Vec2,
    pub heading: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Used at level start and when respawning after losing a ship.
    pub player_starts: Vec<SpawnPoint>,
    /// One fortress is built inside each rectangle.
    pub fortresses: Vec<Rect>,
    /// Free-roaming enemies present from the start.
    #[serde(default)]
    pub enemies: u32,
}

/// Ordered, non-empty list of levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLevelSet")]
pub struct LevelSet {
    levels: Vec<Level>,
}

/// Level file contents before validation.
#[derive(Deserialize)]
struct RawLevelSet {
    levels: Vec<Level>,
}

impl TryFrom<RawLevelSet> for LevelSet {
    type Error = LevelError;

    fn try_from(raw: RawLevelSet) -> Result<Self, LevelError> {
        Self::new(raw.levels)
    }
}

impl LevelSet {
    /// The standard twenty levels.
    pub fn builtin() -> Result<Self, LevelError> {
        Self::from_json(BUILTIN_LEVELS)
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let raw: RawLevelSet = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn new(levels: Vec<Level>) -> Result<Self, LevelError> {
        let set = Self { levels };
        set.validate()?;
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level at `index`, wrapping back to the first level past the end.
    pub fn get(&self, index: usize) -> &Level {
        &self.levels[index % self.levels.len()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Level> {
        self.levels.iter()
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.levels.is_empty() {
            return Err(LevelError::Empty);
        }
        for (level_index, level) in self.levels.iter().enumerate() {
            if level.player_starts.is_empty() {
                return Err(LevelError::NoSpawnPoints { level: level_index });
            }
            if let Some(fortress) = level.fortresses.iter().position(|r| !r.is_valid()) {
                return Err(LevelError::EmptyFortress {
                    level: level_index,
                    fortress,
                });
            }
        }
        Ok(())
    }
}

//! Authoritative simulation for kobo.
//!
//! Owns the actor world and its spatial partitions, runs the per-tick
//! systems at a fixed rate, and builds the command stream each viewpoint
//! needs to draw the current state.

pub mod actors;
pub mod arena;
pub mod engine;
pub mod partition;
pub mod players;
pub mod systems;
pub mod world;
pub mod world_setup;

pub use engine::SimulationEngine;
pub use kobo_core as core;

//! Core types and definitions for the kobo simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! playfield geometry, presentation commands, input, levels and constants.
//! It has no dependency on networking or any runtime framework.

pub mod commands;
pub mod constants;
pub mod enums;
pub mod input;
pub mod level;
pub mod types;

#[cfg(test)]
mod tests;

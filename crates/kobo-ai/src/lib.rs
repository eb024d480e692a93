//! Enemy decision making for kobo.
//!
//! Pure functions over a heading, an offset to the nearest ship and a
//! random source. Nothing here touches the world.

pub mod spawn;
pub mod steering;

pub use kobo_core as core;

#[cfg(test)]
mod tests;

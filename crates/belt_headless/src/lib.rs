//! Headless runner for the asteroid-belt simulation.
//!
//! Drives a seeded [`belt_core::simulation::Simulation`] for a fixed number
//! of turns with an autopilot player and reports JSON metrics. Used for
//! balance runs and CI determinism checks.

pub mod error;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use error::{HeadlessError, Result};

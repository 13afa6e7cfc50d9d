//! Error type for the headless runner.

use thiserror::Error;

use belt_core::error::GameError;

use crate::scenario::ScenarioError;

/// Anything that can stop a headless run.
#[derive(Error, Debug)]
pub enum HeadlessError {
    /// Scenario could not be loaded.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The simulation refused its configuration or desynced.
    #[error("Simulation error: {0}")]
    Game(#[from] GameError),
    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Metrics JSON failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for headless operations.
pub type Result<T> = std::result::Result<T, HeadlessError>;

//! Replays: a seed, a configuration and the action stream.
//!
//! The simulation is a pure function of those three inputs, so a replay
//! recreates a game exactly. The recorded final hash detects any drift.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::simulation::Simulation;

/// Replay format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// A recorded game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Seed the game started from.
    pub seed: u64,
    /// Configuration the game ran under.
    pub config: GameConfig,
    /// Every dispatched action, in order.
    pub actions: Vec<Action>,
    /// Turn when recording stopped.
    pub final_turn: u32,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Capture a simulation's seed, configuration and history.
    #[must_use]
    pub fn record(sim: &Simulation) -> Self {
        Self {
            version: REPLAY_VERSION,
            seed: sim.seed(),
            config: sim.rules().config.clone(),
            actions: sim.history().to_vec(),
            final_turn: sim.turn(),
            final_hash: sim.state_hash(),
        }
    }

    /// Re-run the actions on a fresh simulation.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn play(&self) -> Result<Simulation> {
        let mut sim = Simulation::new(self.config.clone(), self.seed)?;
        for action in &self.actions {
            sim.dispatch(action.clone());
        }
        Ok(sim)
    }

    /// Re-run the replay and compare the final state hash.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] on a version mismatch and
    /// [`GameError::DesyncDetected`] if the re-run ends elsewhere.
    pub fn verify(&self) -> Result<()> {
        if self.version != REPLAY_VERSION {
            return Err(GameError::InvalidConfig(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                self.version
            )));
        }
        let sim = self.play()?;
        let actual = sim.state_hash();
        if sim.turn() != self.final_turn || actual != self.final_hash {
            return Err(GameError::DesyncDetected {
                turn: sim.turn(),
                expected: self.final_hash,
                actual,
            });
        }
        Ok(())
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

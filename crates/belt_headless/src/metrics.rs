//! Metrics collected from headless games.
//!
//! Everything here serializes to JSON for offline analysis.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use belt_core::simulation::TurnReport;
use belt_core::state::{Corporation, GameState};

use crate::error::Result;

/// One turn as seen by the autopilot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnMetrics {
    /// Turn that ended.
    pub turn: u32,
    /// Player credits after the turn.
    pub credits: u64,
    /// Player ships after the turn.
    pub fleet_size: usize,
    /// Units the player mined this turn.
    pub mined: u64,
    /// Credits earned from market sales before ending the turn.
    pub sales: u64,
    /// Autopilot actions that changed the state.
    pub actions_accepted: u32,
    /// Autopilot actions the rules refused.
    pub actions_rejected: u32,
    /// Ships delivered by the build queue.
    pub ships_completed: usize,
    /// Asteroids still worth mining.
    pub active_asteroids: usize,
    /// Strategic moves made by AI corporations.
    pub ai_decisions: usize,
}

impl TurnMetrics {
    /// Combine the end-of-turn report with the state it produced.
    #[must_use]
    pub fn from_report(report: &TurnReport, state: &GameState) -> Self {
        let player = state.corporation(state.player_id);
        Self {
            turn: report.turn,
            credits: player.map_or(0, |p| p.credits),
            fleet_size: player.map_or(0, |p| p.ships.len()),
            mined: report
                .mined
                .get(&state.player_id)
                .map_or(0, |ledger| ledger.total()),
            ships_completed: report.ships_completed.len(),
            active_asteroids: state.active_asteroid_count(),
            ai_decisions: report.ai_decisions.len(),
            ..Default::default()
        }
    }
}

/// Final standing of one corporation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorporationSummary {
    /// Credits held.
    pub credits: u64,
    /// Corporation health.
    pub health: u32,
    /// Ships owned.
    pub ships: usize,
    /// Combat strength.
    pub strength: u64,
    /// Unsold resource units.
    pub resources_held: u64,
    /// Whether the autopilot played this corporation.
    pub is_player: bool,
}

impl From<&Corporation> for CorporationSummary {
    fn from(corp: &Corporation) -> Self {
        Self {
            credits: corp.credits,
            health: corp.health,
            ships: corp.ships.len(),
            strength: corp.strength(),
            resources_held: corp.resources.total(),
            is_player: corp.is_player,
        }
    }
}

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Random seed used.
    pub seed: u64,
    /// Turns played.
    pub turns_played: u32,
    /// Final state hash (for determinism validation).
    pub final_state_hash: u64,
    /// Final standings keyed by corporation name.
    pub corporations: BTreeMap<String, CorporationSummary>,
    /// Per-turn history.
    pub turns: Vec<TurnMetrics>,
}

impl GameMetrics {
    /// Create an empty metrics record.
    #[must_use]
    pub fn new(scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: format!("game_{seed}"),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Append a turn.
    pub fn record_turn(&mut self, turn: TurnMetrics) {
        self.turns_played += 1;
        self.turns.push(turn);
    }

    /// Capture final standings and the state hash.
    pub fn finalize(&mut self, state: &GameState, final_state_hash: u64) {
        self.final_state_hash = final_state_hash;
        self.corporations = state
            .corporations
            .values()
            .map(|corp| (corp.name.clone(), CorporationSummary::from(corp)))
            .collect();
    }

    /// The autopilot's final standing.
    #[must_use]
    pub fn player(&self) -> Option<&CorporationSummary> {
        self.corporations.values().find(|c| c.is_player)
    }

    /// Units mined by the player over the whole game.
    #[must_use]
    pub fn total_mined(&self) -> u64 {
        self.turns.iter().map(|t| t.mined).sum()
    }

    /// Credits earned from market sales over the whole game.
    #[must_use]
    pub fn total_sales(&self) -> u64 {
        self.turns.iter().map(|t| t.sales).sum()
    }

    /// Autopilot actions the rules refused over the whole game.
    #[must_use]
    pub fn total_rejected(&self) -> u32 {
        self.turns.iter().map(|t| t.actions_rejected).sum()
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load from JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

//! Scenario loading.
//!
//! A scenario pins everything a headless game needs: the rules
//! configuration, the seed and how many turns to play.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use belt_core::config::GameConfig;
use belt_core::error::GameError;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found and no built-in scenario by that name.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed, but the rules configuration is unusable.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Seed for the simulation's random source.
    pub seed: u64,
    /// Turns the autopilot plays before the run stops.
    pub turns: u32,
    /// Rules configuration. Omitted fields take their defaults.
    #[serde(default)]
    pub config: GameConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Standard Belt".to_string(),
            description: "Three rival corporations on a standard belt".to_string(),
            seed: 0,
            turns: 50,
            config: GameConfig::default(),
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string and validate the configuration.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Built-in scenario by name, or a RON file at that path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// Built-in scenarios: `standard`, `duel` and `crowded`.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::default()),
            "duel" => Some(Self::duel()),
            "crowded" => Some(Self::crowded()),
            _ => None,
        }
    }

    /// One rival, four asteroids.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "Duel".to_string(),
            description: "Head-to-head against a single rival".to_string(),
            turns: 40,
            config: GameConfig::duel(),
            ..Default::default()
        }
    }

    /// Six rivals competing for a larger belt.
    #[must_use]
    pub fn crowded() -> Self {
        Self {
            name: "Crowded Belt".to_string(),
            description: "Six rivals and plenty of diplomacy".to_string(),
            turns: 60,
            config: GameConfig::crowded(),
            ..Default::default()
        }
    }

    /// Same scenario, different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Same scenario, different length.
    #[must_use]
    pub fn with_turns(mut self, turns: u32) -> Self {
        self.turns = turns;
        self
    }

    /// Pretty RON, suitable for saving as a scenario file.
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_scenarios_parse() {
        let duel = Scenario::from_ron_str(include_str!("../scenarios/duel.ron")).unwrap();
        assert_eq!(duel.config.ai_corporations, 1);
        assert_eq!(duel.turns, 40);

        let crowded = Scenario::from_ron_str(include_str!("../scenarios/crowded.ron")).unwrap();
        assert_eq!(crowded.config.ai_corporations, 6);
        assert_eq!(crowded.config.starting_credits, 400);
    }

    #[test]
    fn test_partial_config_takes_defaults() {
        let scenario =
            Scenario::from_ron_str("(name: \"Tiny\", seed: 3, turns: 5, config: (initial_asteroids: 2))")
                .unwrap();
        assert_eq!(scenario.config.initial_asteroids, 2);
        assert_eq!(scenario.config.starting_credits, GameConfig::default().starting_credits);
        assert!(scenario.description.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Scenario::from_ron_str(
            "(name: \"Broken\", seed: 0, turns: 5, config: (max_energy: 0))",
        );
        assert!(matches!(result, Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_resolve_builtin_and_missing() {
        assert_eq!(Scenario::resolve("duel").unwrap(), Scenario::duel());
        assert!(matches!(
            Scenario::resolve("no/such/scenario.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_ron_roundtrip() {
        let scenario = Scenario::crowded().with_seed(99).with_turns(7);
        let text = scenario.to_ron_string().unwrap();
        assert_eq!(Scenario::from_ron_str(&text).unwrap(), scenario);
    }
}

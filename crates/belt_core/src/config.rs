//! Game configuration.
//!
//! Every tunable constant of the rules lives in [`GameConfig`]. The default
//! reproduces the standard game; scenarios override fields from RON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::factories::AI_CORPORATION_NAMES;

/// Tunable rules constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Name of the player's corporation.
    pub player_name: String,
    /// Number of AI corporations.
    pub ai_corporations: usize,
    /// Credits every corporation starts with.
    pub starting_credits: u64,
    /// Corporation hull points at start.
    pub starting_health: u32,
    /// Energy restored each turn.
    pub max_energy: u32,
    /// Cards dealt at game start.
    pub hand_size: usize,
    /// Copies of each catalog card in the starting deck.
    pub deck_copies: usize,
    /// Cards offered in the shop.
    pub shop_size: usize,
    /// Shop price range, inclusive low, exclusive high.
    pub shop_price_range: (u64, u64),
    /// Asteroids generated at game start.
    pub initial_asteroids: usize,
    /// Below this many non-depleted asteroids, new ones are generated.
    pub min_active_asteroids: usize,
    /// Asteroids generated when replenishing.
    pub replenish_asteroids: usize,
    /// Map width in world units.
    pub map_width: u32,
    /// Map height in world units.
    pub map_height: u32,
    /// Margin kept free along the map edges.
    pub map_padding: u32,
    /// Price of the Advanced Space Dock.
    pub advanced_dock_cost: u64,
    /// Share of the purchase price refunded on sale, in percent.
    pub sale_refund_percent: u32,
    /// Units mined per resource per 100 mining power, in percent of power.
    pub mining_efficiency_percent: u32,
    /// Chance per turn that a trader arrives.
    pub trader_spawn_chance: f64,
    /// Buy price multiplier over sell price on the market.
    pub market_markup: f64,
    /// Credit level above which an AI counts as wealthy.
    pub ai_wealth_threshold: u64,
    /// AI proposal penalty as a percent of the proposer's credits.
    pub ai_proposal_penalty_percent: u32,
    /// Duration of agreements proposed by the AI, in turns.
    pub agreement_duration: u32,
    /// Turns a joint-combat partner has to act.
    pub joint_combat_turns_to_act: u32,
    /// Share of the loser's holdings awarded to a combat winner, in percent.
    pub combat_reward_percent: u32,
    /// Corporation damage taken per ship lost in a lost combat.
    pub defeat_damage_per_ship: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_name: "Terra Mining Corp".to_string(),
            ai_corporations: 3,
            starting_credits: 200,
            starting_health: 80,
            max_energy: 3,
            hand_size: 5,
            deck_copies: 3,
            shop_size: 3,
            shop_price_range: (20, 50),
            initial_asteroids: 6,
            min_active_asteroids: 3,
            replenish_asteroids: 2,
            map_width: 2000,
            map_height: 1500,
            map_padding: 50,
            advanced_dock_cost: 300,
            sale_refund_percent: 50,
            mining_efficiency_percent: 10,
            trader_spawn_chance: 0.2,
            market_markup: 1.2,
            ai_wealth_threshold: 500,
            ai_proposal_penalty_percent: 20,
            agreement_duration: 10,
            joint_combat_turns_to_act: 3,
            combat_reward_percent: 10,
            defeat_damage_per_ship: 10,
        }
    }
}

impl GameConfig {
    /// Head-to-head game against a single AI.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            ai_corporations: 1,
            initial_asteroids: 4,
            ..Default::default()
        }
    }

    /// Crowded belt with many rivals.
    #[must_use]
    pub fn crowded() -> Self {
        Self {
            ai_corporations: 6,
            initial_asteroids: 9,
            ..Default::default()
        }
    }

    /// Set the number of AI corporations.
    #[must_use]
    pub fn with_ai_corporations(mut self, count: usize) -> Self {
        self.ai_corporations = count;
        self
    }

    /// Set starting credits.
    #[must_use]
    pub fn with_starting_credits(mut self, credits: u64) -> Self {
        self.starting_credits = credits;
        self
    }

    /// Set the initial asteroid count.
    #[must_use]
    pub fn with_initial_asteroids(mut self, count: usize) -> Self {
        self.initial_asteroids = count;
        self
    }

    /// Parse from RON and validate. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            source_name: "game config".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| GameError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&contents)
    }

    /// Check that values are consistent.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(GameError::InvalidConfig(msg));

        if self.ai_corporations > AI_CORPORATION_NAMES.len() {
            return fail(format!(
                "at most {} AI corporations are supported, got {}",
                AI_CORPORATION_NAMES.len(),
                self.ai_corporations
            ));
        }
        if self.shop_price_range.0 >= self.shop_price_range.1 {
            return fail(format!(
                "shop price range {:?} is empty",
                self.shop_price_range
            ));
        }
        if self.sale_refund_percent > 100 {
            return fail(format!(
                "sale refund {}% exceeds 100%",
                self.sale_refund_percent
            ));
        }
        if !(0.0..=1.0).contains(&self.trader_spawn_chance) {
            return fail(format!(
                "trader spawn chance {} is not a probability",
                self.trader_spawn_chance
            ));
        }
        if self.market_markup < 1.0 {
            return fail(format!("market markup {} is below 1", self.market_markup));
        }
        if self.map_padding.saturating_mul(2) >= self.map_width.min(self.map_height) {
            return fail("map padding leaves no room for asteroids".to_string());
        }
        if self.max_energy == 0 {
            return fail("max energy must be positive".to_string());
        }
        Ok(())
    }
}

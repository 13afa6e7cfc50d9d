//! # Belt Core
//!
//! Turn-based simulation core for the asteroid-belt mining game.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO beyond parsing data already read into memory
//! - No global randomness (every roll goes through an injected, seedable source)
//!
//! Every state change happens through [`simulation::apply_action`], which
//! takes a state snapshot and an [`action::Action`] and returns the next
//! snapshot. Rejected actions return the input unchanged.
//!
//! ## Crate Structure
//!
//! - [`data`] - Reference catalogs (ships, equipment, cards, resource values)
//! - [`factories`] - Entity construction from templates plus randomization
//! - [`economy`] - Mining yields, market and trader pricing, transactions
//! - [`fleet`] - Ship purchase/sale, equipment, build queue
//! - [`diplomacy`] - Proposals, agreements and status transitions
//! - [`combat`] - Round resolution and aftermath
//! - [`ai`] - Per-ship and per-corporation heuristics
//! - [`cards`] - Deck, hand, shop and card handlers
//! - [`simulation`] - Action dispatch and the end-of-turn pipeline

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod ai;
pub mod cards;
pub mod combat;
pub mod components;
pub mod config;
pub mod data;
pub mod diplomacy;
pub mod economy;
pub mod error;
pub mod factories;
pub mod fleet;
pub mod math;
pub mod replay;
pub mod rng;
pub mod simulation;
pub mod state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{Action, ActionKind};
    pub use crate::cards::{CardHandlerRegistry, CardInstance};
    pub use crate::combat::{CombatAction, CombatState, CombatStatus};
    pub use crate::components::*;
    pub use crate::config::GameConfig;
    pub use crate::data::Catalog;
    pub use crate::diplomacy::{
        AgreementStatus, AgreementTerms, DiplomaticAction, DiplomaticAgreement,
        DiplomaticProposal,
    };
    pub use crate::economy::{Asteroid, Market, Trader};
    pub use crate::error::{ActionError, GameError, Result};
    pub use crate::fleet::{Ship, ShipBuildOrder};
    pub use crate::math::Fixed;
    pub use crate::rng::{seeded_rng, GameRng};
    pub use crate::simulation::{apply_action, Ruleset, Simulation};
    pub use crate::state::{Corporation, GameLog, GameState};
}

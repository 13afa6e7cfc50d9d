//! Error types for the simulation.
//!
//! Two families live here. [`GameError`] covers loading reference data and
//! configuration, where failing loudly is correct. [`ActionError`] is the
//! rejection taxonomy for dispatched actions; it never escapes
//! [`crate::simulation::apply_action`], which turns every rejection into a
//! no-op on the state.

use thiserror::Error;

use crate::components::Resource;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Result type for action handlers.
pub type ActionResult<T = ()> = std::result::Result<T, ActionError>;

/// Errors raised while loading data or configuration.
#[derive(Debug, Error)]
pub enum GameError {
    /// Data parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name or path of the data that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// File could not be read.
    #[error("Failed to read '{path}': {message}")]
    ReadError {
        /// Path that failed.
        path: String,
        /// Underlying IO message.
        message: String,
    },

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catalog is missing an entry something else refers to.
    #[error("Catalog entry not found: {0}")]
    MissingCatalogEntry(String),

    /// Snapshot encoding failed.
    #[error("Failed to encode state: {0}")]
    EncodeError(String),

    /// Replayed game produced a different state.
    #[error("Desync detected at turn {turn}: expected hash {expected}, got {actual}")]
    DesyncDetected {
        /// Turn where the mismatch was observed.
        turn: u32,
        /// Hash recorded in the replay.
        expected: u64,
        /// Hash produced by re-running.
        actual: u64,
    },
}

/// Kind of entity an action referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A corporation.
    Corporation,
    /// A ship.
    Ship,
    /// An asteroid.
    Asteroid,
    /// A trader.
    Trader,
    /// A diplomatic proposal.
    Proposal,
    /// A diplomatic agreement.
    Agreement,
    /// A combat.
    Combat,
    /// A card instance or catalog card.
    Card,
    /// A catalog entry (ship template, equipment).
    CatalogEntry,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Corporation => "corporation",
            Self::Ship => "ship",
            Self::Asteroid => "asteroid",
            Self::Trader => "trader",
            Self::Proposal => "proposal",
            Self::Agreement => "agreement",
            Self::Combat => "combat",
            Self::Card => "card",
            Self::CatalogEntry => "catalog entry",
        };
        f.write_str(name)
    }
}

/// Why an action was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Not enough credits for a purchase, upgrade or trade.
    #[error("Insufficient funds: need {required} credits, have {available}")]
    InsufficientFunds {
        /// Credits required.
        required: u64,
        /// Credits held.
        available: u64,
    },

    /// Not enough of a resource to sell.
    #[error("Insufficient {resource}: need {required}, have {available}")]
    InsufficientResources {
        /// Resource involved.
        resource: Resource,
        /// Amount required.
        required: u64,
        /// Amount held.
        available: u64,
    },

    /// The action referenced something that does not exist.
    #[error("Unknown {kind}: {id}")]
    InvalidReference {
        /// What kind of entity was referenced.
        kind: EntityKind,
        /// The identifier as given.
        id: String,
    },

    /// A slot or fleet limit would be violated.
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Any other rule the action breaks.
    #[error("Precondition unmet: {0}")]
    PreconditionUnmet(String),
}

impl ActionError {
    /// Shorthand for [`ActionError::InvalidReference`].
    pub fn missing(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        Self::InvalidReference {
            kind,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`ActionError::PreconditionUnmet`].
    pub fn unmet(reason: impl Into<String>) -> Self {
        Self::PreconditionUnmet(reason.into())
    }
}

//! The authoritative game state and its corporations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::cards::{ActiveMiningOperation, CardInstance, ShopCard};
use crate::combat::CombatState;
use crate::components::{
    AgreementId, AsteroidId, AsteroidType, CorporationId, DiplomaticStatus, IdAllocator, LogId,
    Personality, ResourceLedger, ShipId,
};
use crate::diplomacy::{AgreementStatus, DiplomaticAgreement, DiplomaticProposal};
use crate::economy::{Asteroid, Market, Trader};
use crate::error::{ActionError, ActionResult, EntityKind};
use crate::fleet::{Ship, ShipBuildOrder};

/// A player or AI faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corporation {
    /// Identifier.
    pub id: CorporationId,
    /// Display name.
    pub name: String,
    /// Hull points.
    pub health: u32,
    /// Maximum hull points.
    pub max_health: u32,
    /// Credits. Unsigned, so never negative.
    pub credits: u64,
    /// Shield points absorbing corporation damage first.
    pub shield: u32,
    /// Resources held.
    pub resources: ResourceLedger,
    /// Asteroid types this corporation can mine with cards.
    pub equipped_mining_types: BTreeSet<AsteroidType>,
    /// Owned ships.
    pub ships: Vec<Ship>,
    /// Whether the Advanced Space Dock is built.
    pub has_advanced_space_dock: bool,
    /// Relationship to every other corporation.
    pub diplomatic_status: BTreeMap<CorporationId, DiplomaticStatus>,
    /// Agreements this corporation is party to.
    pub agreements: Vec<DiplomaticAgreement>,
    /// Whether this is the human player.
    pub is_player: bool,
    /// AI personality; `None` for the player.
    pub personality: Option<Personality>,
}

impl Corporation {
    /// Look up an owned ship.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    /// Look up an owned ship mutably.
    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|s| s.id == id)
    }

    /// Owned ship or an [`ActionError::InvalidReference`].
    pub fn require_ship_mut(&mut self, id: ShipId) -> ActionResult<&mut Ship> {
        self.ship_mut(id)
            .ok_or_else(|| ActionError::missing(EntityKind::Ship, id))
    }

    /// Status toward another corporation (neutral if never set).
    #[must_use]
    pub fn status_with(&self, other: CorporationId) -> DiplomaticStatus {
        self.diplomatic_status
            .get(&other)
            .copied()
            .unwrap_or_default()
    }

    /// Set status toward another corporation.
    pub fn set_status(&mut self, other: CorporationId, status: DiplomaticStatus) {
        self.diplomatic_status.insert(other, status);
    }

    /// Deduct credits, rejecting the deduction if not enough are held.
    pub fn spend(&mut self, amount: u64) -> ActionResult {
        if self.credits < amount {
            return Err(ActionError::InsufficientFunds {
                required: amount,
                available: self.credits,
            });
        }
        self.credits -= amount;
        Ok(())
    }

    /// Add credits.
    pub fn earn(&mut self, amount: u64) {
        self.credits = self.credits.saturating_add(amount);
    }

    /// Sum over owned ships of weapon plus shield power.
    #[must_use]
    pub fn strength(&self) -> u64 {
        self.ships
            .iter()
            .map(|s| u64::from(s.weapon_power()) + u64::from(s.shield_power()))
            .sum()
    }

    /// Apply damage to the corporation; the shield absorbs first.
    pub fn take_damage(&mut self, amount: u32) {
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        self.health = self.health.saturating_sub(amount - absorbed);
    }

    /// Fraction of hull missing, in `[0, 1]`.
    #[must_use]
    pub fn war_exhaustion(&self) -> f64 {
        if self.max_health == 0 {
            return 0.0;
        }
        f64::from(self.max_health.saturating_sub(self.health)) / f64::from(self.max_health)
    }

    /// Active agreements.
    pub fn active_agreements(&self) -> impl Iterator<Item = &DiplomaticAgreement> {
        self.agreements
            .iter()
            .filter(|a| a.status == AgreementStatus::Active)
    }

    /// Agreement by id, mutably.
    pub fn agreement_mut(&mut self, id: AgreementId) -> Option<&mut DiplomaticAgreement> {
        self.agreements.iter_mut().find(|a| a.id == id)
    }
}

/// One append-only audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLog {
    /// Identifier.
    pub id: LogId,
    /// Turn the entry describes.
    pub turn: u32,
    /// Human-readable lines.
    pub messages: Vec<String>,
    /// Resources gained by the player this turn.
    #[serde(default)]
    pub resource_changes: Option<ResourceLedger>,
    /// Net credit change of the player this turn.
    #[serde(default)]
    pub credit_change: Option<i64>,
}

/// The whole simulation state.
///
/// Treated as immutable per step: [`crate::simulation::apply_action`]
/// clones it, mutates the clone and returns either the clone or the
/// untouched input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Turn counter, starting at 1.
    pub turn: u32,
    /// Energy left this turn for playing cards.
    pub energy: u32,
    /// Energy restored each turn.
    pub max_energy: u32,
    /// The human player's corporation.
    pub player_id: CorporationId,
    /// Every corporation, player included.
    pub corporations: BTreeMap<CorporationId, Corporation>,
    /// Asteroids, depleted ones included.
    pub asteroids: Vec<Asteroid>,
    /// Draw pile; index 0 is the top.
    pub deck: Vec<CardInstance>,
    /// The player's hand.
    pub hand: Vec<CardInstance>,
    /// Played and bought cards.
    pub discard_pile: Vec<CardInstance>,
    /// Cards for sale.
    pub shop: Vec<ShopCard>,
    /// Mining operations started by cards.
    pub active_mining_operations: Vec<ActiveMiningOperation>,
    /// Visiting traders.
    pub traders: Vec<Trader>,
    /// Ship build orders of every corporation.
    pub ship_build_queue: Vec<ShipBuildOrder>,
    /// Audit trail.
    pub game_logs: Vec<GameLog>,
    /// Market quotes.
    pub market: Market,
    /// Pending proposals awaiting the player.
    pub diplomatic_proposals: Vec<DiplomaticProposal>,
    /// Combats, active and recently completed.
    pub active_combats: Vec<CombatState>,
    /// Id source.
    pub ids: IdAllocator,
}

impl GameState {
    /// The player's corporation.
    ///
    /// # Panics
    ///
    /// Panics if the state was built without its player corporation.
    #[must_use]
    pub fn player(&self) -> &Corporation {
        &self.corporations[&self.player_id]
    }

    /// Corporation by id.
    #[must_use]
    pub fn corporation(&self, id: CorporationId) -> Option<&Corporation> {
        self.corporations.get(&id)
    }

    /// Corporation by id or an [`ActionError::InvalidReference`].
    pub fn require_corporation(&self, id: CorporationId) -> ActionResult<&Corporation> {
        self.corporations
            .get(&id)
            .ok_or_else(|| ActionError::missing(EntityKind::Corporation, id))
    }

    /// Corporation by id, mutably, or an [`ActionError::InvalidReference`].
    pub fn require_corporation_mut(&mut self, id: CorporationId) -> ActionResult<&mut Corporation> {
        self.corporations
            .get_mut(&id)
            .ok_or_else(|| ActionError::missing(EntityKind::Corporation, id))
    }

    /// The player's corporation, mutably.
    pub fn player_mut(&mut self) -> ActionResult<&mut Corporation> {
        let id = self.player_id;
        self.require_corporation_mut(id)
    }

    /// Asteroid by id.
    #[must_use]
    pub fn asteroid(&self, id: AsteroidId) -> Option<&Asteroid> {
        self.asteroids.iter().find(|a| a.id == id)
    }

    /// Asteroid by id or an [`ActionError::InvalidReference`].
    pub fn require_asteroid(&self, id: AsteroidId) -> ActionResult<&Asteroid> {
        self.asteroid(id)
            .ok_or_else(|| ActionError::missing(EntityKind::Asteroid, id))
    }

    /// Ids of all AI corporations, in id order.
    #[must_use]
    pub fn ai_corporation_ids(&self) -> Vec<CorporationId> {
        self.corporations
            .values()
            .filter(|c| !c.is_player)
            .map(|c| c.id)
            .collect()
    }

    /// Number of asteroids that can still be mined.
    #[must_use]
    pub fn active_asteroid_count(&self) -> usize {
        self.asteroids.iter().filter(|a| !a.is_depleted()).count()
    }
}

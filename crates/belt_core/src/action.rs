//! Actions accepted by [`crate::simulation::apply_action`].
//!
//! A closed set of variants tagged by `type` on the wire
//! (`{"type": "BUY_SHIP", "shipClass": "harvester"}`). Dispatch matches
//! exhaustively, so adding a variant without a handler does not compile.

use serde::{Deserialize, Serialize};

use crate::combat::CombatAction;
use crate::components::{
    AsteroidId, CardInstanceId, CombatId, CorporationId, ProposalId, Resource, ShipClass, ShipId,
    TraderId,
};
use crate::diplomacy::{AgreementTerms, DiplomaticAction};

/// Something a player (or the autopilot) asks the simulation to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    /// Play a card from the hand.
    PlayCard {
        /// Card in the hand.
        card_id: CardInstanceId,
        /// Target for mining cards.
        #[serde(default)]
        target_asteroid_id: Option<AsteroidId>,
    },
    /// Run the end-of-turn pipeline.
    EndTurn,
    /// Draw the top card of the deck.
    DrawCard,
    /// Buy a card from the shop.
    PurchaseCard {
        /// Card in the shop.
        card_id: CardInstanceId,
    },
    /// Deal a fresh shop.
    RefreshShop,
    /// End a card-driven mining operation.
    RecallMiningOperation {
        /// Card backing the operation.
        card_id: CardInstanceId,
    },
    /// Sell resources at a fixed unit price.
    SellResource {
        /// Resource sold.
        resource: Resource,
        /// Units sold.
        amount: u64,
        /// Credits per unit.
        price: u64,
    },
    /// Buy a ship outright.
    BuyShip {
        /// Hull class.
        ship_class: ShipClass,
    },
    /// Sell a ship.
    SellShip {
        /// Ship sold.
        ship_id: ShipId,
    },
    /// Buy equipment and install it.
    BuyEquipment {
        /// Catalog id of the equipment.
        equipment_id: String,
        /// Receiving ship.
        ship_id: ShipId,
    },
    /// Uninstall equipment. No refund.
    RemoveEquipment {
        /// Catalog id of the equipment.
        equipment_id: String,
        /// Ship carrying it.
        ship_id: ShipId,
    },
    /// Send a ship to mine an asteroid.
    AssignShip {
        /// Ship to assign.
        ship_id: ShipId,
        /// Target asteroid.
        asteroid_id: AsteroidId,
    },
    /// Call a ship back from mining.
    RecallShip {
        /// Ship to recall.
        ship_id: ShipId,
    },
    /// Build the Advanced Space Dock.
    UpgradeSpaceDock,
    /// Queue a ship for construction.
    StartShipBuild {
        /// Hull class.
        ship_class: ShipClass,
    },
    /// Buy goods from a visiting trader.
    TradeWithTrader {
        /// Trader.
        trader_id: TraderId,
        /// Resource bought.
        resource: Resource,
        /// Units bought.
        amount: u64,
        /// Credits paid in total.
        total_cost: u64,
    },
    /// Propose an agreement to another corporation.
    ProposeDiplomaticAction {
        /// Agreement kind.
        action: DiplomaticAction,
        /// Target corporation.
        target_corporation_id: CorporationId,
        /// Offered terms.
        #[serde(default)]
        terms: AgreementTerms,
    },
    /// Accept a pending proposal.
    AcceptDiplomaticProposal {
        /// Proposal.
        proposal_id: ProposalId,
    },
    /// Reject a pending proposal.
    RejectDiplomaticProposal {
        /// Proposal.
        proposal_id: ProposalId,
    },
    /// Open a combat.
    InitiateCombat {
        /// Attacking corporation.
        attacker_id: CorporationId,
        /// Defending corporation.
        defender_id: CorporationId,
        /// Attacking ships.
        attacker_ships: Vec<ShipId>,
        /// Defending ships.
        defender_ships: Vec<ShipId>,
    },
    /// Fight one round of a combat.
    PerformCombatAction {
        /// Combat.
        combat_id: CombatId,
        /// Order for the listed ships.
        action: CombatAction,
        /// Ships taking the order.
        ship_ids: Vec<ShipId>,
    },
}

/// Fieldless mirror of [`Action`], for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum ActionKind {
    PlayCard,
    EndTurn,
    DrawCard,
    PurchaseCard,
    RefreshShop,
    RecallMiningOperation,
    SellResource,
    BuyShip,
    SellShip,
    BuyEquipment,
    RemoveEquipment,
    AssignShip,
    RecallShip,
    UpgradeSpaceDock,
    StartShipBuild,
    TradeWithTrader,
    ProposeDiplomaticAction,
    AcceptDiplomaticProposal,
    RejectDiplomaticProposal,
    InitiateCombat,
    PerformCombatAction,
}

impl ActionKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 21] = [
        Self::PlayCard,
        Self::EndTurn,
        Self::DrawCard,
        Self::PurchaseCard,
        Self::RefreshShop,
        Self::RecallMiningOperation,
        Self::SellResource,
        Self::BuyShip,
        Self::SellShip,
        Self::BuyEquipment,
        Self::RemoveEquipment,
        Self::AssignShip,
        Self::RecallShip,
        Self::UpgradeSpaceDock,
        Self::StartShipBuild,
        Self::TradeWithTrader,
        Self::ProposeDiplomaticAction,
        Self::AcceptDiplomaticProposal,
        Self::RejectDiplomaticProposal,
        Self::InitiateCombat,
        Self::PerformCombatAction,
    ];
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Action {
    /// Variant of this action without its payload.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::PlayCard { .. } => ActionKind::PlayCard,
            Self::EndTurn => ActionKind::EndTurn,
            Self::DrawCard => ActionKind::DrawCard,
            Self::PurchaseCard { .. } => ActionKind::PurchaseCard,
            Self::RefreshShop => ActionKind::RefreshShop,
            Self::RecallMiningOperation { .. } => ActionKind::RecallMiningOperation,
            Self::SellResource { .. } => ActionKind::SellResource,
            Self::BuyShip { .. } => ActionKind::BuyShip,
            Self::SellShip { .. } => ActionKind::SellShip,
            Self::BuyEquipment { .. } => ActionKind::BuyEquipment,
            Self::RemoveEquipment { .. } => ActionKind::RemoveEquipment,
            Self::AssignShip { .. } => ActionKind::AssignShip,
            Self::RecallShip { .. } => ActionKind::RecallShip,
            Self::UpgradeSpaceDock => ActionKind::UpgradeSpaceDock,
            Self::StartShipBuild { .. } => ActionKind::StartShipBuild,
            Self::TradeWithTrader { .. } => ActionKind::TradeWithTrader,
            Self::ProposeDiplomaticAction { .. } => ActionKind::ProposeDiplomaticAction,
            Self::AcceptDiplomaticProposal { .. } => ActionKind::AcceptDiplomaticProposal,
            Self::RejectDiplomaticProposal { .. } => ActionKind::RejectDiplomaticProposal,
            Self::InitiateCombat { .. } => ActionKind::InitiateCombat,
            Self::PerformCombatAction { .. } => ActionKind::PerformCombatAction,
        }
    }
}

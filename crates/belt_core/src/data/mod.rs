//! Reference data: ship templates, equipment, cards and trade goods.
//!
//! All structs deserialize from RON. [`Catalog::standard`] provides the
//! built-in tables; [`Catalog::from_ron_str`] loads overrides. Nothing in
//! this module mutates game state.

mod card_data;
mod equipment_data;
mod ship_data;
mod trade_goods;

use serde::{Deserialize, Serialize};

pub use card_data::{standard_cards, CardData, CardKind, Rarity};
pub use equipment_data::{standard_equipment, Equipment};
pub use ship_data::{standard_ships, ShipTemplate, SlotCapacity};
pub use trade_goods::{standard_trade_goods, TradeGood, TradeGoodCategory};

use crate::components::{Resource, ShipClass};
use crate::error::{GameError, Result};

/// Every read-only table the simulation consults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Ship templates.
    pub ships: Vec<ShipTemplate>,
    /// Equipment entries.
    pub equipment: Vec<Equipment>,
    /// Card definitions.
    pub cards: Vec<CardData>,
    /// Market goods, mined resources included.
    pub trade_goods: Vec<TradeGood>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The built-in catalog.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            ships: standard_ships(),
            equipment: standard_equipment(),
            cards: standard_cards(),
            trade_goods: standard_trade_goods(),
        }
    }

    /// Parse a catalog from RON and validate it.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let catalog: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            source_name: "catalog".to_string(),
            message: e.to_string(),
        })?;
        let problems = catalog.validate();
        if let Some(first) = problems.into_iter().next() {
            return Err(GameError::MissingCatalogEntry(first));
        }
        Ok(catalog)
    }

    /// Template for a ship class.
    #[must_use]
    pub fn ship(&self, class: ShipClass) -> Option<&ShipTemplate> {
        self.ships.iter().find(|t| t.class == class)
    }

    /// Equipment entry by id.
    #[must_use]
    pub fn equipment(&self, id: &str) -> Option<&Equipment> {
        self.equipment.iter().find(|e| e.id == id)
    }

    /// Card definition by id.
    #[must_use]
    pub fn card(&self, id: &str) -> Option<&CardData> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Trade good by id.
    #[must_use]
    pub fn trade_good(&self, id: &str) -> Option<&TradeGood> {
        self.trade_goods.iter().find(|g| g.id == id)
    }

    /// Trade good standing for a mined resource.
    #[must_use]
    pub fn resource_good(&self, resource: Resource) -> Option<&TradeGood> {
        self.trade_goods.iter().find(|g| g.resource == Some(resource))
    }

    /// Base value of a resource (zero if missing).
    #[must_use]
    pub fn base_value(&self, resource: Resource) -> u64 {
        self.resource_good(resource).map_or(0, |g| g.base_value)
    }

    /// Check that the tables are complete and consistent.
    ///
    /// Returns a list of problems (empty if valid).
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for class in ShipClass::ALL {
            if self.ship(class).is_none() {
                problems.push(format!("missing ship template for '{class}'"));
            }
        }
        for resource in Resource::ALL {
            if self.resource_good(resource).is_none() {
                problems.push(format!("missing trade good for '{resource}'"));
            }
        }
        for (i, good) in self.trade_goods.iter().enumerate() {
            if self.trade_goods[..i].iter().any(|g| g.id == good.id) {
                problems.push(format!("trade good '{}' listed twice", good.id));
            }
            if !(0.0..=1.0).contains(&good.volatility) {
                problems.push(format!("trade good '{}' has volatility {}", good.id, good.volatility));
            }
        }
        for item in &self.equipment {
            if item.required_classes.is_empty() {
                problems.push(format!("equipment '{}' allows no ship class", item.id));
            }
        }
        for card in &self.cards {
            if card.kind == CardKind::Mining && card.mining_power.is_none() {
                problems.push(format!("mining card '{}' has no mining power", card.id));
            }
        }

        problems
    }
}

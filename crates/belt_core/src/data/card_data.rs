//! Card catalog entries.
//!
//! Cards here are pure data. What a card does when played is looked up by
//! its id in [`crate::cards::CardHandlerRegistry`].

use serde::{Deserialize, Serialize};

use crate::components::AsteroidType;

/// Card category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    /// Starts a mining operation on an asteroid.
    Mining,
    /// Permanent upgrade to the corporation.
    Equipment,
    /// Economic effect.
    Economic,
}

/// Card rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    /// Common.
    Common,
    /// Uncommon.
    Uncommon,
    /// Rare.
    Rare,
}

/// A card definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardData {
    /// Catalog id, also the handler key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub kind: CardKind,
    /// Energy needed to play.
    pub cost: u32,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Rarity.
    pub rarity: Rarity,
    /// Asteroid type a mining card is restricted to.
    #[serde(default)]
    pub asteroid_type_requirement: Option<AsteroidType>,
    /// Mining power of a mining operation started by this card.
    #[serde(default)]
    pub mining_power: Option<u32>,
}

/// Built-in cards.
#[must_use]
pub fn standard_cards() -> Vec<CardData> {
    vec![
        CardData {
            id: "basic-mining-laser".to_string(),
            name: "Basic Mining Laser".to_string(),
            kind: CardKind::Mining,
            cost: 1,
            description: "Mine a C-type asteroid".to_string(),
            rarity: Rarity::Common,
            asteroid_type_requirement: Some(AsteroidType::C),
            mining_power: Some(50),
        },
        CardData {
            id: "s-type-converter".to_string(),
            name: "S-Type Converter".to_string(),
            kind: CardKind::Equipment,
            cost: 3,
            description: "Enables mining of S-type asteroids".to_string(),
            rarity: Rarity::Uncommon,
            asteroid_type_requirement: None,
            mining_power: None,
        },
        CardData {
            id: "m-type-converter".to_string(),
            name: "M-Type Converter".to_string(),
            kind: CardKind::Equipment,
            cost: 5,
            description: "Enables mining of M-type asteroids".to_string(),
            rarity: Rarity::Rare,
            asteroid_type_requirement: None,
            mining_power: None,
        },
        CardData {
            id: "advanced-mining-laser".to_string(),
            name: "Advanced Mining Laser".to_string(),
            kind: CardKind::Mining,
            cost: 2,
            description: "Mine any equipped asteroid type".to_string(),
            rarity: Rarity::Uncommon,
            asteroid_type_requirement: None,
            mining_power: Some(75),
        },
    ]
}

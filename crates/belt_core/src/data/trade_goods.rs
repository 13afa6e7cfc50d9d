//! Trade goods quoted on the market.
//!
//! Mined resources appear here as raw materials so the market can quote
//! them; everything else is cargo the belt trades but nobody mines.

use serde::{Deserialize, Serialize};

use super::Rarity;
use crate::components::Resource;

/// Market category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeGoodCategory {
    /// Mined ore and volatiles.
    RawMaterials,
    /// Life support and fuel.
    BasicResources,
    /// Luxury goods.
    LuxuryGoods,
    /// Industrial supplies.
    Industrial,
    /// Medical supplies.
    Medical,
    /// Computing hardware.
    Technology,
    /// Ship components.
    ShipParts,
}

/// One line of the trade-good table.
///
/// # Example (RON)
///
/// ```ron
/// TradeGood(
///     id: "fuel_cells",
///     name: "Fuel Cells",
///     category: basic_resources,
///     base_value: 100,
///     volatility: 0.2,
///     rarity: common,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeGood {
    /// Catalog id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Market category.
    pub category: TradeGoodCategory,
    /// Base value per unit, in credits.
    pub base_value: u64,
    /// Fractional price swing per quote, in `[0, 1]`.
    pub volatility: f64,
    /// How often the good turns up.
    pub rarity: Rarity,
    /// The mined resource this good stands for, if any.
    #[serde(default)]
    pub resource: Option<Resource>,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
}

fn raw(resource: Resource, name: &str, base_value: u64, rarity: Rarity) -> TradeGood {
    TradeGood {
        id: resource.name().to_string(),
        name: name.to_string(),
        category: TradeGoodCategory::RawMaterials,
        base_value,
        volatility: 0.2,
        rarity,
        resource: Some(resource),
        description: String::new(),
    }
}

fn good(
    id: &str,
    name: &str,
    category: TradeGoodCategory,
    base_value: u64,
    volatility: f64,
    rarity: Rarity,
    description: &str,
) -> TradeGood {
    TradeGood {
        id: id.to_string(),
        name: name.to_string(),
        category,
        base_value,
        volatility,
        rarity,
        resource: None,
        description: description.to_string(),
    }
}

/// The built-in trade-good table.
#[must_use]
#[rustfmt::skip]
pub fn standard_trade_goods() -> Vec<TradeGood> {
    use Rarity::{Common, Rare, Uncommon};
    use Resource as R;
    use TradeGoodCategory::{BasicResources, Industrial, LuxuryGoods, Medical, ShipParts, Technology};

    vec![
        raw(R::Silicates, "Silicates", 10, Common),
        raw(R::Oxides, "Oxides", 15, Common),
        raw(R::Sulfides, "Sulfides", 20, Common),
        raw(R::Iron, "Iron", 25, Common),
        raw(R::Nickel, "Nickel", 30, Uncommon),
        raw(R::Silicon, "Silicon", 35, Uncommon),
        raw(R::Magnesium, "Magnesium", 40, Rare),
        good("water", "Water", BasicResources, 50, 0.1, Common, "Purified water for life support and industry"),
        good("air_canisters", "Air Canisters", BasicResources, 75, 0.15, Common, "Compressed breathable air"),
        good("fuel_cells", "Fuel Cells", BasicResources, 100, 0.2, Common, "Standard reactor fuel cells"),
        good("exotic_minerals", "Exotic Minerals", LuxuryGoods, 500, 0.4, Rare, "Crystalline formations from deep space"),
        good("art_artifacts", "Artistic Artifacts", LuxuryGoods, 750, 0.5, Rare, "Pieces made in zero gravity"),
        good("gourmet_supplies", "Gourmet Supplies", LuxuryGoods, 300, 0.3, Uncommon, "High-end food and drink"),
        good("industrial_lubricants", "Industrial Lubricants", Industrial, 150, 0.2, Common, "Machinery lubricants"),
        good("construction_materials", "Construction Materials", Industrial, 200, 0.25, Common, "Space-grade building materials"),
        good("mining_explosives", "Mining Explosives", Industrial, 400, 0.3, Uncommon, "Controlled charges for asteroid work"),
        good("medical_supplies", "Medical Supplies", Medical, 300, 0.2, Common, "First aid and basic medicine"),
        good("advanced_medications", "Advanced Medications", Medical, 600, 0.3, Uncommon, "Specialized space medicine"),
        good("nanomed_units", "Nanomed Units", Medical, 1000, 0.4, Rare, "Nanomedicine treatments"),
        good("computer_cores", "Computer Cores", Technology, 800, 0.3, Uncommon, "High-performance computing units"),
        good("quantum_processors", "Quantum Processors", Technology, 1500, 0.4, Rare, "Quantum computing components"),
        good("ai_modules", "AI Modules", Technology, 1200, 0.35, Rare, "Machine intelligence processing units"),
        good("shield_generators", "Shield Generators", ShipParts, 500, 0.25, Common, "Standard shield generation units"),
        good("warp_coils", "Warp Coils", ShipParts, 900, 0.3, Uncommon, "FTL drive components"),
        good("weapon_systems", "Weapon Systems", ShipParts, 700, 0.35, Uncommon, "Military-grade weapon components"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_resource_has_a_raw_good() {
        let goods = standard_trade_goods();
        for resource in Resource::ALL {
            let matching = goods.iter().filter(|g| g.resource == Some(resource)).count();
            assert_eq!(matching, 1, "{resource}");
        }
        assert!(goods
            .iter()
            .filter(|g| g.resource.is_some())
            .all(|g| g.category == TradeGoodCategory::RawMaterials));
    }

    #[test]
    fn test_volatility_is_a_fraction() {
        for good in standard_trade_goods() {
            assert!((0.0..=1.0).contains(&good.volatility), "{}", good.id);
        }
    }
}

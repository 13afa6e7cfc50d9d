//! Economy resolution: mining yields, pricing and resource transactions.
//!
//! All quantities are integers. Random price fluctuation is computed in
//! floating point and rounded once, so prices are reproducible from the
//! seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{AsteroidId, AsteroidType, Resource, ResourceLedger, TraderId};
use crate::data::Catalog;
use crate::error::{ActionError, ActionResult};
use crate::fleet::Ship;
use crate::math::Vec2Fixed;
use crate::rng::signed_roll;
use crate::state::Corporation;

/// One resource deposit inside an asteroid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositionEntry {
    /// Resource.
    pub resource: Resource,
    /// Units left. Only ever decreases.
    pub amount: u64,
    /// Base value per unit.
    pub base_value: u64,
}

/// A mineable asteroid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asteroid {
    /// Identifier.
    pub id: AsteroidId,
    /// Display name.
    pub name: String,
    /// Structural integrity; mining wears it down to zero.
    pub health: u32,
    /// Starting integrity.
    pub max_health: u32,
    /// Deposits.
    pub composition: Vec<CompositionEntry>,
    /// Difficulty tier.
    pub difficulty: u32,
    /// Spectral type.
    pub asteroid_type: AsteroidType,
    /// Map position.
    pub position: Vec2Fixed,
}

impl Asteroid {
    /// Exhausted asteroids can no longer be mined or assigned. Leftover
    /// composition stays as unmineable residue.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.health == 0
    }

    /// Units of a resource left.
    #[must_use]
    pub fn amount_of(&self, resource: Resource) -> u64 {
        self.composition
            .iter()
            .filter(|c| c.resource == resource)
            .map(|c| c.amount)
            .sum()
    }

    /// Total units left.
    #[must_use]
    pub fn total_amount(&self) -> u64 {
        self.composition.iter().map(|c| c.amount).sum()
    }

    /// Total base value of what is left.
    #[must_use]
    pub fn remaining_value(&self) -> u64 {
        self.composition
            .iter()
            .map(|c| c.amount.saturating_mul(c.base_value))
            .sum()
    }
}

/// Result of one mining resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningOutcome {
    /// The asteroid after mining.
    pub asteroid: Asteroid,
    /// Units extracted per resource.
    pub yields: ResourceLedger,
}

/// Sum of mining power the given ships apply to an asteroid.
#[must_use]
pub fn assigned_mining_power(asteroid: &Asteroid, ships: &[&Ship]) -> u32 {
    ships
        .iter()
        .map(|s| s.mining_power_against(asteroid.asteroid_type))
        .sum()
}

/// Resolve one turn of mining by the given ships.
///
/// See [`resolve_mining_power`] for the yield rule.
#[must_use]
pub fn resolve_mining(asteroid: &Asteroid, ships: &[&Ship], efficiency_percent: u32) -> MiningOutcome {
    resolve_mining_power(asteroid, assigned_mining_power(asteroid, ships), efficiency_percent)
}

/// Resolve one turn of mining with a known total power.
///
/// Each deposit yields `floor(power * efficiency_percent / 100)` units,
/// capped by what is left. Asteroid health drops by `power`, flooring at
/// zero. An exhausted asteroid or zero power yields nothing.
#[must_use]
pub fn resolve_mining_power(asteroid: &Asteroid, power: u32, efficiency_percent: u32) -> MiningOutcome {
    let mut updated = asteroid.clone();
    let mut yields = ResourceLedger::new();

    if asteroid.is_depleted() || power == 0 {
        return MiningOutcome {
            asteroid: updated,
            yields,
        };
    }

    let per_deposit = u64::from(power) * u64::from(efficiency_percent) / 100;
    for deposit in &mut updated.composition {
        let mined = per_deposit.min(deposit.amount);
        deposit.amount -= mined;
        yields.add(deposit.resource, mined);
    }
    updated.health = updated.health.saturating_sub(power);

    MiningOutcome {
        asteroid: updated,
        yields,
    }
}

/// `round(base * multiplier * (1 + u * volatility))` with `u` uniform in
/// `[-1, 1]`. Negative or NaN volatility counts as zero; the result never
/// goes below zero.
pub fn price_with_volatility<R: Rng + ?Sized>(
    base_value: u64,
    multiplier: f64,
    volatility: f64,
    rng: &mut R,
) -> u64 {
    let volatility = if volatility.is_nan() { 0.0 } else { volatility.max(0.0) };
    let fluctuation = 1.0 + signed_roll(rng) * volatility;
    let price = (base_value as f64 * multiplier * fluctuation).round();
    if price.is_finite() && price > 0.0 {
        price as u64
    } else {
        0
    }
}

/// Current market quote for one trade good.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketPrice {
    /// Trade good id.
    pub good_id: String,
    /// Mined resource the good stands for, if any.
    pub resource: Option<Resource>,
    /// What the market pays per unit.
    pub sell_price: u64,
    /// What the market charges per unit.
    pub buy_price: u64,
    /// Units on offer this turn.
    pub supply: u64,
    /// Turn the quote was made.
    pub last_update: u32,
}

/// Market quotes, refreshed every turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Market {
    /// One quote per trade good, in catalog order.
    pub prices: Vec<MarketPrice>,
    /// Turn of the last refresh.
    pub last_refresh: u32,
}

impl Market {
    /// Quote for a mined resource.
    #[must_use]
    pub fn price(&self, resource: Resource) -> Option<&MarketPrice> {
        self.prices.iter().find(|p| p.resource == Some(resource))
    }

    /// Quote for a trade good by id.
    #[must_use]
    pub fn quote(&self, good_id: &str) -> Option<&MarketPrice> {
        self.prices.iter().find(|p| p.good_id == good_id)
    }

    /// Re-quote every trade good from its base value and volatility, and
    /// roll a fresh supply of 50 to 149 units.
    pub fn refresh<R: Rng + ?Sized>(&mut self, catalog: &Catalog, turn: u32, markup: f64, rng: &mut R) {
        self.prices = catalog
            .trade_goods
            .iter()
            .map(|good| {
                let sell_price = price_with_volatility(good.base_value, 1.0, good.volatility, rng);
                MarketPrice {
                    good_id: good.id.clone(),
                    resource: good.resource,
                    sell_price,
                    buy_price: (sell_price as f64 * markup).round() as u64,
                    supply: rng.random_range(50..150),
                    last_update: turn,
                }
            })
            .collect();
        self.last_refresh = turn;
    }
}

/// One line of a trader's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraderGood {
    /// Resource offered.
    pub resource: Resource,
    /// Units in stock.
    pub amount: u64,
    /// Multiplier over base value.
    pub price_multiplier: f64,
    /// Price volatility.
    pub volatility: f64,
}

/// A visiting merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trader {
    /// Identifier.
    pub id: TraderId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    pub description: String,
    /// Stock.
    pub inventory: Vec<TraderGood>,
    /// Turns until the trader leaves.
    pub turns_remaining: u32,
}

impl Trader {
    /// Stock line for a resource.
    #[must_use]
    pub fn good(&self, resource: Resource) -> Option<&TraderGood> {
        self.inventory.iter().find(|g| g.resource == resource)
    }
}

/// Per-unit price a trader asks for a resource right now.
pub fn quote_trader_price<R: Rng + ?Sized>(
    trader: &Trader,
    resource: Resource,
    catalog: &Catalog,
    rng: &mut R,
) -> Option<u64> {
    let good = trader.good(resource)?;
    Some(price_with_volatility(
        catalog.base_value(resource),
        good.price_multiplier,
        good.volatility,
        rng,
    ))
}

/// Sell resources to the market at a fixed per-unit price.
///
/// Resources drop by exactly `amount` and credits rise by exactly
/// `amount * price`.
pub fn sell_resource(corp: &mut Corporation, resource: Resource, amount: u64, price: u64) -> ActionResult<u64> {
    let proceeds = amount
        .checked_mul(price)
        .ok_or_else(|| ActionError::unmet("sale value overflows"))?;
    corp.resources.remove(resource, amount)?;
    corp.earn(proceeds);
    Ok(proceeds)
}

/// Buy `amount` of `resource` from a trader for `total_cost` credits.
pub fn trade_with_trader(
    corp: &mut Corporation,
    trader: &mut Trader,
    resource: Resource,
    amount: u64,
    total_cost: u64,
) -> ActionResult {
    let trader_name = trader.name.clone();
    let good = trader
        .inventory
        .iter_mut()
        .find(|g| g.resource == resource)
        .ok_or_else(|| ActionError::unmet(format!("{trader_name} does not sell {resource}")))?;
    if good.amount < amount {
        return Err(ActionError::InsufficientResources {
            resource,
            required: amount,
            available: good.amount,
        });
    }
    corp.spend(total_cost)?;
    good.amount -= amount;
    corp.resources.add(resource, amount);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    fn iron_asteroid(amount: u64, health: u32) -> Asteroid {
        Asteroid {
            id: AsteroidId::new(1),
            name: "Psyche Core".to_string(),
            health,
            max_health: health,
            composition: vec![CompositionEntry {
                resource: Resource::Iron,
                amount,
                base_value: 25,
            }],
            difficulty: 1,
            asteroid_type: AsteroidType::M,
            position: Vec2Fixed::ZERO,
        }
    }

    #[test]
    fn test_mining_yield_uses_efficiency() {
        let asteroid = iron_asteroid(100, 60);
        let outcome = resolve_mining_power(&asteroid, 50, 10);
        assert_eq!(outcome.yields.get(Resource::Iron), 5);
        assert_eq!(outcome.asteroid.amount_of(Resource::Iron), 95);
        assert_eq!(outcome.asteroid.health, 10);
    }

    #[test]
    fn test_mining_caps_at_remaining_and_floors_health() {
        let asteroid = iron_asteroid(3, 20);
        let outcome = resolve_mining_power(&asteroid, 500, 10);
        assert_eq!(outcome.yields.get(Resource::Iron), 3);
        assert_eq!(outcome.asteroid.amount_of(Resource::Iron), 0);
        assert_eq!(outcome.asteroid.health, 0);
        assert!(outcome.asteroid.is_depleted());
    }

    #[test]
    fn test_depleted_asteroid_yields_nothing() {
        let asteroid = iron_asteroid(100, 0);
        let outcome = resolve_mining_power(&asteroid, 80, 10);
        assert!(outcome.yields.is_empty());
        assert_eq!(outcome.asteroid, asteroid);
    }

    fn drill_hauler() -> Ship {
        let catalog = Catalog::standard();
        let mut ship = crate::factories::create_ship(
            catalog.ship(crate::components::ShipClass::Transporter).unwrap(),
            crate::components::ShipId::new(7),
            crate::components::CorporationId::new(1),
            "Owner",
            &mut seeded_rng(7),
        );
        ship.equipment.mining = vec![
            catalog.equipment("quantum-drill").unwrap().clone(),
            catalog.equipment("basic-mining-laser").unwrap().clone(),
        ];
        ship
    }

    #[test]
    fn test_drill_only_bites_metallic_asteroids() {
        let hauler = drill_hauler();
        let metallic = iron_asteroid(100, 200);
        let mut carbonaceous = iron_asteroid(100, 200);
        carbonaceous.asteroid_type = AsteroidType::C;

        // Drill 50 plus laser 10 on M; laser alone on C.
        let on_m = resolve_mining(&metallic, &[&hauler], 10);
        assert_eq!(on_m.yields.get(Resource::Iron), 6);
        assert_eq!(on_m.asteroid.health, 140);

        let on_c = resolve_mining(&carbonaceous, &[&hauler], 10);
        assert_eq!(on_c.yields.get(Resource::Iron), 1);
        assert_eq!(on_c.asteroid.health, 190);
    }

    #[test]
    fn test_unequipped_ships_leave_asteroid_alone() {
        let mut hauler = drill_hauler();
        hauler.equipment.mining.clear();
        let asteroid = iron_asteroid(100, 200);
        let outcome = resolve_mining(&asteroid, &[&hauler], 10);
        assert!(outcome.yields.is_empty());
        assert_eq!(outcome.asteroid, asteroid);
    }

    #[test]
    fn test_price_without_volatility_is_exact() {
        let mut rng = seeded_rng(5);
        assert_eq!(price_with_volatility(25, 1.0, 0.0, &mut rng), 25);
        assert_eq!(price_with_volatility(25, 1.2, -0.5, &mut rng), 30);
    }

    #[test]
    fn test_price_stays_within_volatility_band() {
        let mut rng = seeded_rng(11);
        for _ in 0..500 {
            let price = price_with_volatility(100, 1.0, 0.2, &mut rng);
            assert!((80..=120).contains(&price), "price {price}");
        }
    }

    #[test]
    fn test_market_refresh_quotes_every_good() {
        let catalog = Catalog::standard();
        let mut market = Market::default();
        market.refresh(&catalog, 4, 1.2, &mut seeded_rng(2));
        assert_eq!(market.prices.len(), catalog.trade_goods.len());
        assert_eq!(market.last_refresh, 4);
        for quote in &market.prices {
            assert!(quote.buy_price >= quote.sell_price);
            assert!((50..150).contains(&quote.supply));
        }
        for resource in Resource::ALL {
            assert!(market.price(resource).is_some(), "{resource}");
        }
        assert_eq!(market.quote("water").unwrap().resource, None);
    }

    #[test]
    fn test_market_swing_follows_each_good() {
        let mut catalog = Catalog::standard();
        for good in &mut catalog.trade_goods {
            good.volatility = if good.id == "art_artifacts" { 0.5 } else { 0.0 };
        }
        let mut rng = seeded_rng(13);
        let mut market = Market::default();
        let mut swung = false;
        for turn in 0..50 {
            market.refresh(&catalog, turn, 1.2, &mut rng);
            assert_eq!(market.price(Resource::Iron).unwrap().sell_price, 25);
            assert_eq!(market.quote("water").unwrap().sell_price, 50);
            let art = market.quote("art_artifacts").unwrap().sell_price;
            assert!((375..=1125).contains(&art), "art {art}");
            swung |= art != 750;
        }
        assert!(swung);
    }

    #[test]
    fn test_trader_quote_only_for_stocked_goods() {
        let trader = Trader {
            id: TraderId::new(1),
            name: "Deep Space Exchange".to_string(),
            description: String::new(),
            inventory: vec![TraderGood {
                resource: Resource::Nickel,
                amount: 80,
                price_multiplier: 1.0,
                volatility: 0.0,
            }],
            turns_remaining: 10,
        };
        let catalog = Catalog::standard();
        let mut rng = seeded_rng(1);
        assert_eq!(
            quote_trader_price(&trader, Resource::Nickel, &catalog, &mut rng),
            Some(30)
        );
        assert_eq!(
            quote_trader_price(&trader, Resource::Iron, &catalog, &mut rng),
            None
        );
    }
}

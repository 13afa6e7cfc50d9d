//! Test fixtures and helpers.
//!
//! Pre-built games and entities for consistent testing. Everything here is
//! seeded, so two calls with the same arguments build equal values.

use belt_core::components::{
    AsteroidId, AsteroidType, CorporationId, IdAllocator, Personality, Resource, ShipClass,
    ShipId,
};
use belt_core::config::GameConfig;
use belt_core::data::Catalog;
use belt_core::economy::{Asteroid, CompositionEntry};
use belt_core::factories::{create_corporation, create_ship};
use belt_core::fleet::Ship;
use belt_core::math::Vec2Fixed;
use belt_core::rng::seeded_rng;
use belt_core::simulation::Simulation;
use belt_core::state::Corporation;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// A simulation with the default configuration.
///
/// # Panics
///
/// Panics if the default configuration fails validation.
#[must_use]
pub fn standard_sim(seed: u64) -> Simulation {
    Simulation::new(GameConfig::default(), seed).expect("default config is valid")
}

/// A player against a single AI corporation.
///
/// # Panics
///
/// Panics if the duel configuration fails validation.
#[must_use]
pub fn duel_sim(seed: u64) -> Simulation {
    Simulation::new(GameConfig::duel(), seed).expect("duel config is valid")
}

/// A standalone corporation with the starter ship.
#[must_use]
pub fn corporation(name: &str, credits: u64, personality: Option<Personality>) -> Corporation {
    let config = GameConfig::default().with_starting_credits(credits);
    let mut ids = IdAllocator::new();
    create_corporation(
        name,
        personality.is_none(),
        personality,
        &config,
        &Catalog::standard(),
        &mut ids,
        &mut seeded_rng(name.len() as u64),
    )
}

/// A destructor carrying one weapon and one shield of the given powers.
///
/// A power of zero leaves that slot empty.
///
/// # Panics
///
/// Panics if the built-in catalog lacks the destructor or its gear.
#[must_use]
pub fn armed_ship(id: u64, owner: u64, weapon: u32, shield: u32, health: i32) -> Ship {
    let catalog = Catalog::standard();
    let template = catalog
        .ship(ShipClass::Destructor)
        .expect("destructor template");
    let mut ship = create_ship(
        template,
        ShipId::new(id),
        CorporationId::new(owner),
        "Fixture Corp",
        &mut seeded_rng(id),
    );
    if weapon > 0 {
        let mut cannon = catalog
            .equipment("plasma-cannon")
            .expect("plasma cannon")
            .clone();
        cannon.power = weapon;
        ship.equipment.weapon.push(cannon);
    }
    if shield > 0 {
        let mut plating = catalog
            .equipment("advanced-shield")
            .expect("advanced shield")
            .clone();
        plating.power = shield;
        ship.equipment.defense.push(plating);
    }
    ship.health = fixed(health);
    ship.max_health = fixed(health);
    ship
}

/// A C-type asteroid holding `amount` of a single resource.
#[must_use]
pub fn single_deposit_asteroid(id: u64, resource: Resource, amount: u64, health: u32) -> Asteroid {
    Asteroid {
        id: AsteroidId::new(id),
        name: format!("Fixture-{id}"),
        health,
        max_health: health,
        composition: vec![CompositionEntry {
            resource,
            amount,
            base_value: 20,
        }],
        difficulty: 1,
        asteroid_type: AsteroidType::C,
        position: Vec2Fixed::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_reproducible() {
        assert_eq!(standard_sim(9).state(), standard_sim(9).state());
        assert_eq!(armed_ship(1, 2, 30, 10, 100), armed_ship(1, 2, 30, 10, 100));
    }

    #[test]
    fn test_armed_ship_powers() {
        let ship = armed_ship(1, 2, 30, 0, 100);
        assert_eq!(ship.weapon_power(), 30);
        assert_eq!(ship.shield_power(), 0);
        assert_eq!(ship.health, fixed(100));
    }

    #[test]
    fn test_corporation_kind_follows_personality() {
        assert!(corporation("Player", 200, None).is_player);
        let ai = corporation("Rival", 200, Some(Personality::new(0.5, 0.5, 0.5)));
        assert!(!ai.is_player);
        assert_eq!(ai.credits, 200);
    }
}

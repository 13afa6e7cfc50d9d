//! Entity factories.
//!
//! Build ships, corporations, asteroids and traders from catalog templates
//! plus seeded randomization, and assemble a fresh [`GameState`].

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::cards::{build_starting_deck, deal_shop};
use crate::components::{
    AsteroidId, AsteroidType, CorporationId, DiplomaticStatus, IdAllocator, Personality, Resource,
    ResourceLedger, ShipClass, ShipId, TraderId,
};
use crate::config::GameConfig;
use crate::data::{Catalog, ShipTemplate};
use crate::economy::{Asteroid, CompositionEntry, Market, Trader, TraderGood};
use crate::fleet::{InstalledEquipment, Ship};
use crate::math::{Fixed, Vec2Fixed};
use crate::rng::unit_roll;
use crate::state::{Corporation, GameState};

/// Names given to AI corporations, in order.
pub const AI_CORPORATION_NAMES: [&str; 8] = [
    "Stellar Dynamics",
    "Nova Industries",
    "Orion Mining Co.",
    "Asteroid Technologies",
    "Cosmic Resources Ltd.",
    "Nebula Enterprises",
    "Galactic Mining Corp",
    "Deep Space Industries",
];

const ASTEROID_NAMES: [&str; 7] = [
    "Ceres Prime",
    "Vesta Major",
    "Pallas-IX",
    "Hygiea Belt",
    "Psyche Core",
    "Eros Fragment",
    "Ida Cluster",
];

const TRADER_PROFILES: [(&str, &str); 5] = [
    ("Stellar Syndicate", "A powerful trading guild spanning multiple star systems"),
    ("Nova Corps Trading", "Military surplus dealers with exotic materials"),
    ("Asteroid Belt Merchants", "Local traders specializing in raw materials"),
    ("Deep Space Exchange", "Long-haul traders bringing goods from distant sectors"),
    ("Orion Market Network", "A decentralized network of independent traders"),
];

const STARTER_SHIP: ShipClass = ShipClass::Prospector;
const STARTER_EQUIPMENT: &str = "basic-mining-laser";

/// Build a ship from a template. Equipment slots start empty.
pub fn create_ship<R: Rng + ?Sized>(
    template: &ShipTemplate,
    id: ShipId,
    owner_id: CorporationId,
    owner_name: &str,
    rng: &mut R,
) -> Ship {
    let stem = template
        .names
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| template.class.name().to_string());
    let max_health = Fixed::from_num(template.max_health);

    Ship {
        id,
        name: format!("{stem}-{}", rng.random_range(0..1000)),
        class: template.class,
        cost: template.cost,
        max_health,
        health: max_health,
        slots: template.slots,
        equipment: InstalledEquipment::default(),
        assigned_asteroid_id: None,
        speed: template.speed,
        range: template.range,
        carrier_capacity: template.carrier_capacity,
        carried_ships: Vec::new(),
        owner_id,
        owner_name: owner_name.to_string(),
    }
}

/// Random personality with every trait uniform in `[0, 1)`.
pub fn random_personality<R: Rng + ?Sized>(rng: &mut R) -> Personality {
    Personality::new(unit_roll(rng), unit_roll(rng), unit_roll(rng))
}

/// Build a corporation with the starting treasury and one equipped
/// prospector.
pub fn create_corporation<R: Rng + ?Sized>(
    name: &str,
    is_player: bool,
    personality: Option<Personality>,
    config: &GameConfig,
    catalog: &Catalog,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> Corporation {
    let id: CorporationId = ids.allocate();

    let mut ships = Vec::new();
    if let Some(template) = catalog.ship(STARTER_SHIP) {
        let mut ship = create_ship(template, ids.allocate(), id, name, rng);
        if let Some(laser) = catalog.equipment(STARTER_EQUIPMENT) {
            ship.equipment.mining.push(laser.clone());
        }
        ships.push(ship);
    }

    Corporation {
        id,
        name: name.to_string(),
        health: config.starting_health,
        max_health: config.starting_health,
        credits: config.starting_credits,
        shield: 0,
        resources: ResourceLedger::new(),
        equipped_mining_types: BTreeSet::from([AsteroidType::C]),
        ships,
        has_advanced_space_dock: false,
        diplomatic_status: BTreeMap::new(),
        agreements: Vec::new(),
        is_player,
        personality,
    }
}

fn roll_asteroid_type<R: Rng + ?Sized>(difficulty: u32, rng: &mut R) -> AsteroidType {
    let roll = unit_roll(rng);
    if difficulty > 3 && roll < 0.2 {
        AsteroidType::M
    } else if difficulty > 2 && roll < 0.5 {
        AsteroidType::S
    } else {
        AsteroidType::C
    }
}

/// Generate one asteroid of the given difficulty tier.
///
/// Health is `20 + 10 * difficulty`; each deposit holds
/// `20 + uniform[0, 50 * difficulty)` units.
pub fn generate_asteroid<R: Rng + ?Sized>(
    id: AsteroidId,
    difficulty: u32,
    config: &GameConfig,
    catalog: &Catalog,
    rng: &mut R,
) -> Asteroid {
    let difficulty = difficulty.max(1);
    let asteroid_type = roll_asteroid_type(difficulty, rng);
    let composition = asteroid_type
        .composition()
        .iter()
        .map(|&resource| CompositionEntry {
            resource,
            amount: 20 + rng.random_range(0..u64::from(difficulty) * 50),
            base_value: catalog.base_value(resource),
        })
        .collect();

    let pad = config.map_padding;
    let x = rng.random_range(pad..config.map_width.saturating_sub(pad).max(pad + 1));
    let y = rng.random_range(pad..config.map_height.saturating_sub(pad).max(pad + 1));
    let name = ASTEROID_NAMES.choose(rng).copied().unwrap_or("Unnamed Rock");
    let health = 20 + difficulty * 10;

    Asteroid {
        id,
        name: name.to_string(),
        health,
        max_health: health,
        composition,
        difficulty,
        asteroid_type,
        position: Vec2Fixed::from_ints(x as i32, y as i32),
    }
}

/// Generate `count` asteroids; the i-th gets difficulty `i / 3 + 1`.
pub fn generate_asteroids<R: Rng + ?Sized>(
    count: usize,
    config: &GameConfig,
    catalog: &Catalog,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> Vec<Asteroid> {
    (0..count)
        .map(|i| {
            let difficulty = (i / 3 + 1) as u32;
            generate_asteroid(ids.allocate(), difficulty, config, catalog, rng)
        })
        .collect()
}

/// Generate a visiting trader stocking two to four distinct resources.
pub fn generate_trader<R: Rng + ?Sized>(id: TraderId, rng: &mut R) -> Trader {
    let (name, description) = TRADER_PROFILES
        .choose(rng)
        .copied()
        .unwrap_or(TRADER_PROFILES[0]);

    let mut stock: Vec<Resource> = Resource::ALL.to_vec();
    stock.shuffle(rng);
    let lines = rng.random_range(2..=4);
    let inventory = stock
        .into_iter()
        .take(lines)
        .map(|resource| TraderGood {
            resource,
            amount: rng.random_range(50..150),
            price_multiplier: rng.random_range(0.8..1.2),
            volatility: rng.random_range(0.0..0.2),
        })
        .collect();

    Trader {
        id,
        name: name.to_string(),
        description: description.to_string(),
        inventory,
        turns_remaining: rng.random_range(10..=20),
    }
}

/// Assemble the opening state: the player, AI rivals, asteroids, the
/// starting deck and hand, the shop and market quotes.
pub fn new_game<R: Rng + ?Sized>(config: &GameConfig, catalog: &Catalog, rng: &mut R) -> GameState {
    let mut ids = IdAllocator::new();

    let player = create_corporation(&config.player_name, true, None, config, catalog, &mut ids, rng);
    let player_id = player.id;
    let mut corporations = BTreeMap::new();
    corporations.insert(player.id, player);

    for name in AI_CORPORATION_NAMES.iter().take(config.ai_corporations) {
        let personality = random_personality(rng);
        let corp = create_corporation(name, false, Some(personality), config, catalog, &mut ids, rng);
        corporations.insert(corp.id, corp);
    }

    let all_ids: Vec<CorporationId> = corporations.keys().copied().collect();
    for corp in corporations.values_mut() {
        for &other in &all_ids {
            if other != corp.id {
                corp.set_status(other, DiplomaticStatus::Neutral);
            }
        }
    }

    let asteroids = generate_asteroids(config.initial_asteroids, config, catalog, &mut ids, rng);

    let mut deck = build_starting_deck(catalog, config.deck_copies, &mut ids, rng);
    let dealt = config.hand_size.min(deck.len());
    let hand: Vec<_> = deck.drain(..dealt).collect();
    let shop = deal_shop(catalog, config, &mut ids, rng);

    let mut market = Market::default();
    market.refresh(catalog, 1, config.market_markup, rng);

    GameState {
        turn: 1,
        energy: config.max_energy,
        max_energy: config.max_energy,
        player_id,
        corporations,
        asteroids,
        deck,
        hand,
        discard_pile: Vec::new(),
        shop,
        active_mining_operations: Vec::new(),
        traders: Vec::new(),
        ship_build_queue: Vec::new(),
        game_logs: Vec::new(),
        market,
        diplomatic_proposals: Vec::new(),
        active_combats: Vec::new(),
        ids,
    }
}

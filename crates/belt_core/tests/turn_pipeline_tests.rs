//! End-to-end tests of action dispatch and the END_TURN pipeline.
//!
//! These drive the public `apply_action` / `Simulation` surface only.

use belt_core::action::Action;
use belt_core::components::{AsteroidId, Resource, ShipClass};
use belt_core::economy::{resolve_mining_power, Asteroid, CompositionEntry};
use belt_core::config::GameConfig;
use belt_core::rng::seeded_rng;
use belt_core::simulation::{apply_action, run_end_turn, try_apply_action, Ruleset, Simulation};
use belt_core::state::GameState;
use belt_test_utils::determinism::strategies::arb_action;
use belt_test_utils::fixtures::{single_deposit_asteroid, standard_sim};
use belt_test_utils::proptest::prelude::*;

fn rich_sim(seed: u64) -> Simulation {
    Simulation::new(GameConfig::default().with_starting_credits(5000), seed).unwrap()
}

/// An asteroid holding the given amounts of the first resources in order.
fn mixed_asteroid(amounts: &[u64], health: u32) -> Asteroid {
    let mut asteroid = single_deposit_asteroid(900, Resource::ALL[0], 0, health);
    asteroid.composition = Resource::ALL
        .iter()
        .zip(amounts)
        .map(|(&resource, &amount)| CompositionEntry {
            resource,
            amount,
            base_value: 20,
        })
        .collect();
    asteroid
}

fn ships_of_class(state: &GameState, class: ShipClass) -> usize {
    state.player().ships.iter().filter(|s| s.class == class).count()
}

// =============================================================================
// Example scenarios
// =============================================================================

#[test]
fn test_cruiser_purchase_without_dock_is_a_no_op() {
    let sim = standard_sim(1);
    let state = sim.state().clone();
    assert_eq!(state.player().credits, 200);

    let next = apply_action(
        &state,
        &Action::BuyShip {
            ship_class: ShipClass::CommandCruiser,
        },
        &Ruleset::standard(),
        &mut seeded_rng(1),
    );

    assert_eq!(next, state);
    assert_eq!(next.player().credits, 200);
    assert_eq!(next.player().ships, state.player().ships);
}

#[test]
fn test_single_deposit_mining_scenario() {
    let mut state = standard_sim(2).state().clone();
    state.asteroids = vec![single_deposit_asteroid(900, Resource::Iron, 100, 200)];
    let player_id = state.player_id;
    let player = state.corporations.get_mut(&player_id).unwrap();
    player.ships[0].equipment.mining[0].power = 50;
    let ship_id = player.ships[0].id;

    let rules = Ruleset::standard();
    let mut rng = seeded_rng(2);
    let assigned = apply_action(
        &state,
        &Action::AssignShip {
            ship_id,
            asteroid_id: AsteroidId::new(900),
        },
        &rules,
        &mut rng,
    );
    let next = apply_action(&assigned, &Action::EndTurn, &rules, &mut rng);

    let asteroid = next.asteroid(AsteroidId::new(900)).unwrap();
    let mined = 100 - asteroid.amount_of(Resource::Iron);
    assert_eq!(mined, 5);
    assert_eq!(next.player().resources.get(Resource::Iron), mined);
    assert_eq!(asteroid.health, 150);

    let log = next.game_logs.last().unwrap();
    assert_eq!(
        log.resource_changes.as_ref().map(|r| r.get(Resource::Iron)),
        Some(5)
    );
}

// =============================================================================
// Fleet and construction
// =============================================================================

#[test]
fn test_fleet_never_drops_below_one_ship() {
    let mut sim = standard_sim(3);
    let starter = sim.state().player().ships[0].id;
    assert!(!sim.dispatch(Action::SellShip { ship_id: starter }));
    assert_eq!(sim.state().player().ships.len(), 1);

    assert!(sim.dispatch(Action::BuyShip {
        ship_class: ShipClass::Prospector
    }));
    assert!(sim.dispatch(Action::SellShip { ship_id: starter }));
    assert_eq!(sim.state().player().credits, 200 - 100 + 50);

    let last = sim.state().player().ships[0].id;
    assert!(!sim.dispatch(Action::SellShip { ship_id: last }));
    assert_eq!(sim.state().player().ships.len(), 1);
}

#[test]
fn test_build_order_delivers_after_build_turns() {
    for (class, needs_dock) in [
        (ShipClass::Scoutship, false),
        (ShipClass::AssaultFighter, false),
        (ShipClass::Destructor, true),
    ] {
        let mut sim = rich_sim(4);
        if needs_dock {
            assert!(sim.dispatch(Action::UpgradeSpaceDock));
        }
        let before = ships_of_class(sim.state(), class);
        assert!(sim.dispatch(Action::StartShipBuild { ship_class: class }));
        let total = sim.state().ship_build_queue[0].total_turns;

        for _ in 1..total {
            sim.end_turn();
            assert_eq!(sim.state().ship_build_queue.len(), 1, "{class} finished early");
        }
        let report = sim.end_turn();
        assert!(sim.state().ship_build_queue.is_empty());
        assert_eq!(report.ships_completed.len(), 1);
        assert_eq!(ships_of_class(sim.state(), class), before + 1);
    }
}

#[test]
fn test_build_cost_is_paid_up_front() {
    let mut sim = rich_sim(5);
    assert!(sim.dispatch(Action::StartShipBuild {
        ship_class: ShipClass::Scoutship
    }));
    assert_eq!(sim.state().player().credits, 5000 - 150);
    sim.end_turn();
    assert_eq!(sim.state().player().ships.len(), 2);
}

// =============================================================================
// Traders and the market
// =============================================================================

#[test]
fn test_trader_purchase_moves_stock() {
    let mut state = rich_sim(6).state().clone();
    let mut rng = seeded_rng(6);
    state
        .traders
        .push(belt_core::factories::generate_trader(state.ids.allocate(), &mut rng));
    let trader = state.traders[0].clone();
    let good = trader.inventory[0].clone();

    let next = apply_action(
        &state,
        &Action::TradeWithTrader {
            trader_id: trader.id,
            resource: good.resource,
            amount: 10,
            total_cost: 300,
        },
        &Ruleset::standard(),
        &mut rng,
    );

    assert_eq!(next.player().credits, 5000 - 300);
    assert_eq!(next.player().resources.get(good.resource), 10);
    assert_eq!(next.traders[0].inventory[0].amount, good.amount - 10);
}

#[test]
fn test_market_is_requoted_every_turn() {
    let mut sim = standard_sim(7);
    for turn in 2..6 {
        sim.end_turn();
        let market = &sim.state().market;
        assert_eq!(market.last_refresh, turn);
        assert_eq!(market.prices.len(), sim.rules().catalog.trade_goods.len());
        for quote in &market.prices {
            assert!(quote.buy_price >= quote.sell_price);
            assert_eq!(quote.last_update, turn);
        }
        assert!(Resource::ALL.iter().all(|&r| market.price(r).is_some()));
    }
}

#[test]
fn test_traders_come_and_go() {
    let config = GameConfig {
        trader_spawn_chance: 1.0,
        ..GameConfig::default()
    };
    let mut sim = Simulation::new(config, 8).unwrap();
    let report = sim.end_turn();
    assert_eq!(report.traders_arrived.len(), 1);

    let mut departed = 0;
    for _ in 0..25 {
        departed += sim.end_turn().traders_departed;
    }
    assert!(departed > 0);
    assert!(sim.state().traders.iter().all(|t| t.turns_remaining > 0));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rejected_actions_leave_state_untouched(seed in 0u64..500, action in arb_action()) {
        let state = standard_sim(seed).state().clone();
        let rules = Ruleset::standard();
        if try_apply_action(&state, &action, &rules, &mut seeded_rng(seed)).is_err() {
            let next = apply_action(&state, &action, &rules, &mut seeded_rng(seed));
            prop_assert_eq!(next, state);
        }
    }

    #[test]
    fn prop_sale_conserves_value(held in 0u64..500, amount in 0u64..600, price in 0u64..100) {
        let mut state = standard_sim(9).state().clone();
        let player_id = state.player_id;
        state.corporations.get_mut(&player_id).unwrap().resources.add(Resource::Nickel, held);
        let credits = state.player().credits;

        let next = apply_action(
            &state,
            &Action::SellResource { resource: Resource::Nickel, amount, price },
            &Ruleset::standard(),
            &mut seeded_rng(9),
        );

        if amount <= held {
            prop_assert_eq!(next.player().resources.get(Resource::Nickel), held - amount);
            prop_assert_eq!(next.player().credits, credits + amount * price);
        } else {
            prop_assert_eq!(next, state);
        }
    }

    #[test]
    fn prop_sell_ship_keeps_fleet_floor(seed in 0u64..200, buys in 0usize..3, sells in 0usize..5) {
        let mut sim = rich_sim(seed);
        for _ in 0..buys {
            sim.dispatch(Action::BuyShip { ship_class: ShipClass::Scoutship });
        }
        for _ in 0..sells {
            let ship_id = sim.state().player().ships[0].id;
            sim.dispatch(Action::SellShip { ship_id });
            prop_assert!(!sim.state().player().ships.is_empty());
        }
    }

    #[test]
    fn prop_mining_only_ever_depletes(
        amounts in proptest::collection::vec(0u64..500, 1..=7),
        health in 0u32..300,
        power in 0u32..400,
        efficiency in 0u32..200,
    ) {
        let asteroid = mixed_asteroid(&amounts, health);
        let outcome = resolve_mining_power(&asteroid, power, efficiency);

        prop_assert!(outcome.asteroid.health <= asteroid.health);
        for (before, after) in asteroid.composition.iter().zip(&outcome.asteroid.composition) {
            prop_assert!(after.amount <= before.amount);
            prop_assert_eq!(outcome.yields.get(before.resource), before.amount - after.amount);
        }
    }

    #[test]
    fn prop_end_turn_mining_matches_player_gain(
        seed in 0u64..200,
        amounts in proptest::collection::vec(0u64..500, 1..=7),
        health in 0u32..300,
        power in 1u32..200,
    ) {
        let mut state = standard_sim(seed).state().clone();
        let player_id = state.player_id;
        let asteroid = mixed_asteroid(&amounts, health);
        let asteroid_id = asteroid.id;
        state.asteroids = vec![asteroid.clone()];
        for corp in state.corporations.values_mut() {
            for ship in &mut corp.ships {
                ship.assigned_asteroid_id = None;
            }
        }
        let player = state.corporations.get_mut(&player_id).unwrap();
        player.ships[0].equipment.mining[0].power = power;
        player.ships[0].assigned_asteroid_id = Some(asteroid_id);
        let held_before = player.resources.clone();

        let report = run_end_turn(&mut state, &Ruleset::standard(), &mut seeded_rng(seed));

        let after = state.asteroids.iter().find(|a| a.id == asteroid_id).unwrap();
        prop_assert!(after.health <= asteroid.health);
        let mined = report.mined.get(&player_id).cloned().unwrap_or_default();
        for (before, now) in asteroid.composition.iter().zip(&after.composition) {
            prop_assert!(now.amount <= before.amount);
            let taken = before.amount - now.amount;
            prop_assert_eq!(mined.get(before.resource), taken);
            prop_assert_eq!(
                state.player().resources.get(before.resource),
                held_before.get(before.resource) + taken
            );
        }
    }
}

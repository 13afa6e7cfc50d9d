//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A game is a pure function of its configuration, its seed and the
//! actions dispatched into it. Sources of non-determinism to watch for:
//!
//! - **Map iteration order**: state keeps corporations in `BTreeMap`s and
//!   every pipeline step walks them in id order.
//!
//! - **Randomness**: every roll goes through the simulation's seeded
//!   `SmallRng`; nothing reads a thread-local or OS random source.
//!
//! - **Rejected actions**: they still advance the random source when a
//!   resolver rolls before rejecting, so histories record them too.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual resolvers (mining, combat rounds, proposals)
//! 2. **Property tests**: random action streams still replay exactly
//! 3. **Integration tests**: full games are reproducible from a replay
//! 4. **Parallel tests**: N games on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use belt_core::action::Action;
use belt_core::replay::Replay;
use belt_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns simulated.
    pub turns: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `turns` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    turns: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..turns {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        turns,
    }
}

/// Run a game twice with identical setup, ending the turn `turns` times,
/// and compare final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, turns: u32) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        turns,
        &setup_fn,
        |sim| {
            sim.end_turn();
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Run N games on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, turns: u32) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..turns {
                        sim.end_turn();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        turns,
    }
}

/// Feed the same actions to two fresh games, finding the first action
/// after which their hashes differ.
///
/// Returns `None` if the games never diverge, `Some(0)` if they differ
/// before any action, and `Some(n)` if they diverge after the n-th action.
pub fn find_first_divergence<F>(setup_fn: F, actions: &[Action]) -> Option<usize>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for (index, action) in actions.iter().enumerate() {
        sim1.dispatch(action.clone());
        sim2.dispatch(action.clone());
        if sim1.state_hash() != sim2.state_hash() {
            return Some(index + 1);
        }
    }

    None
}

/// Record a game after `actions` and check that its replay verifies.
pub fn verify_replay_determinism<F>(setup_fn: F, actions: &[Action]) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for action in actions {
        sim.dispatch(action.clone());
    }
    Replay::record(&sim).verify().is_ok()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// Identifiers are drawn from a small range so that generated actions
/// regularly hit real entities of a freshly built game as well as
/// missing ones.
pub mod strategies {
    use belt_core::action::Action;
    use belt_core::combat::CombatAction;
    use belt_core::components::{
        AsteroidId, CardInstanceId, CombatId, CorporationId, Personality, ProposalId, Resource,
        ShipClass, ShipId, TraderId,
    };
    use belt_core::diplomacy::{AgreementTerms, DiplomaticAction};
    use proptest::prelude::*;

    /// Any id in the range a small game allocates.
    pub fn arb_raw_id() -> impl Strategy<Value = u64> {
        1u64..80u64
    }

    /// Any resource.
    pub fn arb_resource() -> impl Strategy<Value = Resource> {
        prop::sample::select(Resource::ALL.to_vec())
    }

    /// Any ship class.
    pub fn arb_ship_class() -> impl Strategy<Value = ShipClass> {
        prop::sample::select(ShipClass::ALL.to_vec())
    }

    /// Any agreement kind.
    pub fn arb_diplomatic_action() -> impl Strategy<Value = DiplomaticAction> {
        prop_oneof![
            Just(DiplomaticAction::NonAggression),
            Just(DiplomaticAction::JointCombat),
            Just(DiplomaticAction::Peace),
        ]
    }

    /// Any combat order.
    pub fn arb_combat_action() -> impl Strategy<Value = CombatAction> {
        prop_oneof![
            Just(CombatAction::Attack),
            Just(CombatAction::Defend),
            Just(CombatAction::Retreat),
        ]
    }

    /// Personality traits in `[0, 1]`.
    pub fn arb_personality() -> impl Strategy<Value = Personality> {
        (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0)
            .prop_map(|(a, c, g)| Personality::new(a, c, g))
    }

    /// Agreement terms with modest penalties.
    pub fn arb_terms() -> impl Strategy<Value = AgreementTerms> {
        (
            0u64..200,
            proptest::option::of(1u32..15),
            proptest::option::of(1u32..5),
        )
            .prop_map(|(penalty, duration, turns_to_act)| AgreementTerms {
                penalty,
                duration,
                turns_to_act,
            })
    }

    /// Equipment ids from the built-in catalog, plus one that is missing.
    pub fn arb_equipment_id() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "basic-mining-laser",
            "advanced-mining-laser",
            "quantum-drill",
            "basic-shield",
            "point-defense",
            "plasma-cannon",
            "no-such-gear",
        ])
        .prop_map(str::to_string)
    }

    /// Player-side economic and fleet actions.
    pub fn arb_economy_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (arb_resource(), 0u64..50, 0u64..60).prop_map(|(resource, amount, price)| {
                Action::SellResource {
                    resource,
                    amount,
                    price,
                }
            }),
            arb_ship_class().prop_map(|ship_class| Action::BuyShip { ship_class }),
            arb_raw_id().prop_map(|id| Action::SellShip {
                ship_id: ShipId::new(id)
            }),
            (arb_equipment_id(), arb_raw_id()).prop_map(|(equipment_id, id)| {
                Action::BuyEquipment {
                    equipment_id,
                    ship_id: ShipId::new(id),
                }
            }),
            (arb_equipment_id(), arb_raw_id()).prop_map(|(equipment_id, id)| {
                Action::RemoveEquipment {
                    equipment_id,
                    ship_id: ShipId::new(id),
                }
            }),
            (arb_raw_id(), arb_raw_id()).prop_map(|(ship, asteroid)| Action::AssignShip {
                ship_id: ShipId::new(ship),
                asteroid_id: AsteroidId::new(asteroid),
            }),
            arb_raw_id().prop_map(|id| Action::RecallShip {
                ship_id: ShipId::new(id)
            }),
            Just(Action::UpgradeSpaceDock),
            arb_ship_class().prop_map(|ship_class| Action::StartShipBuild { ship_class }),
            (arb_raw_id(), arb_resource(), 0u64..40, 0u64..400).prop_map(
                |(id, resource, amount, total_cost)| Action::TradeWithTrader {
                    trader_id: TraderId::new(id),
                    resource,
                    amount,
                    total_cost,
                }
            ),
        ]
    }

    /// Card actions.
    pub fn arb_card_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (arb_raw_id(), proptest::option::of(arb_raw_id())).prop_map(|(card, target)| {
                Action::PlayCard {
                    card_id: CardInstanceId::new(card),
                    target_asteroid_id: target.map(AsteroidId::new),
                }
            }),
            Just(Action::DrawCard),
            arb_raw_id().prop_map(|id| Action::PurchaseCard {
                card_id: CardInstanceId::new(id)
            }),
            Just(Action::RefreshShop),
            arb_raw_id().prop_map(|id| Action::RecallMiningOperation {
                card_id: CardInstanceId::new(id)
            }),
        ]
    }

    /// Diplomacy and combat actions.
    pub fn arb_conflict_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (arb_diplomatic_action(), 1u64..6, arb_terms()).prop_map(|(action, target, terms)| {
                Action::ProposeDiplomaticAction {
                    action,
                    target_corporation_id: CorporationId::new(target),
                    terms,
                }
            }),
            arb_raw_id().prop_map(|id| Action::AcceptDiplomaticProposal {
                proposal_id: ProposalId::new(id)
            }),
            arb_raw_id().prop_map(|id| Action::RejectDiplomaticProposal {
                proposal_id: ProposalId::new(id)
            }),
            (
                1u64..6,
                1u64..6,
                proptest::collection::vec(arb_raw_id(), 1..3),
                proptest::collection::vec(arb_raw_id(), 1..3),
            )
                .prop_map(|(attacker, defender, a_ships, d_ships)| {
                    Action::InitiateCombat {
                        attacker_id: CorporationId::new(attacker),
                        defender_id: CorporationId::new(defender),
                        attacker_ships: a_ships.into_iter().map(ShipId::new).collect(),
                        defender_ships: d_ships.into_iter().map(ShipId::new).collect(),
                    }
                }),
            (
                arb_raw_id(),
                arb_combat_action(),
                proptest::collection::vec(arb_raw_id(), 0..3),
            )
                .prop_map(|(combat, action, ships)| Action::PerformCombatAction {
                    combat_id: CombatId::new(combat),
                    action,
                    ship_ids: ships.into_iter().map(ShipId::new).collect(),
                }),
        ]
    }

    /// Any action; END_TURN is weighted up so streams cover several turns.
    pub fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            3 => Just(Action::EndTurn),
            4 => arb_economy_action(),
            2 => arb_card_action(),
            2 => arb_conflict_action(),
        ]
    }

    /// A sequence of actions.
    pub fn arb_action_sequence(max_len: usize) -> impl Strategy<Value = Vec<Action>> {
        proptest::collection::vec(arb_action(), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{duel_sim, standard_sim};
    use belt_core::components::ShipClass;
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_non_determinism() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_standard_game_determinism() {
        assert!(verify_simulation_determinism(|| standard_sim(11), 20));
    }

    #[test]
    fn test_parallel_games_match() {
        run_parallel_simulations(|| duel_sim(3), 4, 15).assert_deterministic();
    }

    #[test]
    fn test_find_divergence_on_deterministic_game() {
        let actions = vec![
            Action::BuyShip {
                ship_class: ShipClass::Prospector,
            },
            Action::EndTurn,
            Action::RefreshShop,
            Action::EndTurn,
        ];
        assert_eq!(find_first_divergence(|| standard_sim(5), &actions), None);
        assert!(verify_replay_determinism(|| standard_sim(5), &actions));
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_random_action_streams_replay(
            seed in 0u64..1000,
            actions in strategies::arb_action_sequence(40),
        ) {
            prop_assert_eq!(find_first_divergence(|| standard_sim(seed), &actions), None);
            prop_assert!(verify_replay_determinism(|| standard_sim(seed), &actions));
        }
    }
}

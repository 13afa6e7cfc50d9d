//! Autopilot game runner.
//!
//! Each turn the autopilot player:
//! 1. answers proposals addressed to it (accepts non-aggression and peace,
//!    rejects joint combat)
//! 2. sells its whole cargo at the current market sell price
//! 3. grows the fleet: mining hulls with a laser fitted, and the Advanced
//!    Space Dock once the fleet is large enough
//! 4. assigns idle ships to the richest non-depleted asteroid they can mine
//! 5. ends the turn

use std::cmp::Reverse;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use belt_core::action::Action;
use belt_core::components::ShipClass;
use belt_core::diplomacy::DiplomaticAction;
use belt_core::replay::Replay;
use belt_core::simulation::{Ruleset, Simulation};
use belt_core::state::{Corporation, GameState};

use crate::error::Result;
use crate::metrics::{GameMetrics, TurnMetrics};
use crate::scenario::Scenario;

/// Tuning knobs for the autopilot player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autopilot {
    /// Credits never spent on ships or the dock.
    pub credit_reserve: u64,
    /// Stop buying ships at this fleet size.
    pub max_fleet: usize,
    /// Save for the dock once the fleet reaches this size.
    pub dock_after_ships: usize,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            credit_reserve: 0,
            max_fleet: 12,
            dock_after_ships: 3,
        }
    }
}

/// A purchase the autopilot wants to make next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FleetMove {
    UpgradeDock,
    Commission {
        hull: ShipClass,
        laser: &'static str,
    },
}

impl Autopilot {
    /// Hull and laser bought at the current dock level.
    fn mining_kit(has_dock: bool) -> (ShipClass, &'static str) {
        if has_dock {
            (ShipClass::Harvester, "advanced-mining-laser")
        } else {
            (ShipClass::Prospector, "basic-mining-laser")
        }
    }

    fn next_fleet_move(&self, player: &Corporation, rules: &Ruleset) -> Option<FleetMove> {
        if player.ships.len() >= self.max_fleet {
            return None;
        }
        let budget = player.credits.saturating_sub(self.credit_reserve);

        if !player.has_advanced_space_dock && player.ships.len() >= self.dock_after_ships {
            return (budget >= rules.config.advanced_dock_cost).then_some(FleetMove::UpgradeDock);
        }

        let (hull, laser) = Self::mining_kit(player.has_advanced_space_dock);
        let hull_cost = rules.catalog.ship(hull)?.cost;
        let laser_cost = rules.catalog.equipment(laser)?.cost;
        (budget >= hull_cost + laser_cost).then_some(FleetMove::Commission { hull, laser })
    }
}

fn player(state: &GameState) -> Option<&Corporation> {
    state.corporation(state.player_id)
}

/// Answers to every proposal addressed to the player.
fn proposal_answers(state: &GameState) -> Vec<Action> {
    state
        .diplomatic_proposals
        .iter()
        .filter(|p| p.to == state.player_id)
        .map(|p| match p.action {
            DiplomaticAction::NonAggression | DiplomaticAction::Peace => {
                Action::AcceptDiplomaticProposal { proposal_id: p.id }
            }
            DiplomaticAction::JointCombat => Action::RejectDiplomaticProposal { proposal_id: p.id },
        })
        .collect()
}

/// Sell orders for the whole cargo at the current market price.
fn cargo_sales(state: &GameState) -> Vec<Action> {
    let Some(player) = player(state) else {
        return Vec::new();
    };
    player
        .resources
        .iter()
        .filter(|&(_, amount)| amount > 0)
        .filter_map(|(resource, amount)| {
            let price = state.market.price(resource)?.sell_price;
            (price > 0).then_some(Action::SellResource {
                resource,
                amount,
                price,
            })
        })
        .collect()
}

/// Assignments sending each idle ship to the most valuable asteroid it
/// can mine. Ties go to the lowest asteroid id.
fn mining_assignments(state: &GameState) -> Vec<Action> {
    let Some(player) = player(state) else {
        return Vec::new();
    };
    player
        .ships
        .iter()
        .filter(|ship| ship.assigned_asteroid_id.is_none())
        .filter_map(|ship| {
            state
                .asteroids
                .iter()
                .filter(|a| !a.is_depleted() && ship.mining_power_against(a.asteroid_type) > 0)
                .max_by_key(|a| (a.remaining_value(), Reverse(a.id)))
                .map(|a| Action::AssignShip {
                    ship_id: ship.id,
                    asteroid_id: a.id,
                })
        })
        .collect()
}

/// Runs one scenario with the autopilot.
pub struct HeadlessRunner {
    sim: Simulation,
    autopilot: Autopilot,
    metrics: GameMetrics,
    current: TurnMetrics,
}

impl HeadlessRunner {
    /// Set up the scenario's simulation.
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let sim = Simulation::new(scenario.config.clone(), scenario.seed)?;
        tracing::debug!(
            scenario = %scenario.name,
            seed = scenario.seed,
            corporations = sim.state().corporations.len(),
            "Runner created"
        );
        Ok(Self {
            sim,
            autopilot: Autopilot::default(),
            metrics: GameMetrics::new(&scenario.name, scenario.seed),
            current: TurnMetrics::default(),
        })
    }

    /// Replace the autopilot tuning.
    #[must_use]
    pub fn with_autopilot(mut self, autopilot: Autopilot) -> Self {
        self.autopilot = autopilot;
        self
    }

    /// Play the whole scenario and return its metrics.
    pub fn run(scenario: &Scenario) -> Result<GameMetrics> {
        let mut runner = Self::new(scenario)?;
        runner.play(scenario.turns);
        Ok(runner.finish())
    }

    /// Play several turns.
    pub fn play(&mut self, turns: u32) {
        for _ in 0..turns {
            self.play_turn();
        }
    }

    /// Play one turn and return what happened.
    pub fn play_turn(&mut self) -> TurnMetrics {
        self.current = TurnMetrics::default();

        for answer in proposal_answers(self.sim.state()) {
            self.submit(answer);
        }
        self.sell_cargo();
        self.expand_fleet();
        for assignment in mining_assignments(self.sim.state()) {
            self.submit(assignment);
        }

        let report = self.sim.end_turn();
        let turn = TurnMetrics {
            sales: self.current.sales,
            actions_accepted: self.current.actions_accepted,
            actions_rejected: self.current.actions_rejected,
            ..TurnMetrics::from_report(&report, self.sim.state())
        };
        tracing::debug!(
            turn = turn.turn,
            credits = turn.credits,
            fleet = turn.fleet_size,
            mined = turn.mined,
            "Autopilot turn"
        );
        self.metrics.record_turn(turn.clone());
        turn
    }

    fn submit(&mut self, action: Action) -> bool {
        let changed = self.sim.dispatch(action);
        if changed {
            self.current.actions_accepted += 1;
        } else {
            self.current.actions_rejected += 1;
        }
        changed
    }

    fn sell_cargo(&mut self) {
        for sale in cargo_sales(self.sim.state()) {
            let proceeds = match &sale {
                Action::SellResource { amount, price, .. } => amount.saturating_mul(*price),
                _ => 0,
            };
            if self.submit(sale) {
                self.current.sales += proceeds;
            }
        }
    }

    fn expand_fleet(&mut self) {
        loop {
            let Some(player) = player(self.sim.state()) else {
                return;
            };
            let Some(next) = self.autopilot.next_fleet_move(player, self.sim.rules()) else {
                return;
            };
            let done = match next {
                FleetMove::UpgradeDock => self.submit(Action::UpgradeSpaceDock),
                FleetMove::Commission { hull, laser } => self.commission(hull, laser),
            };
            if !done {
                return;
            }
        }
    }

    /// Buy a hull and fit a laser to it.
    fn commission(&mut self, hull: ShipClass, laser: &str) -> bool {
        if !self.submit(Action::BuyShip { ship_class: hull }) {
            return false;
        }
        let Some(ship_id) = player(self.sim.state()).and_then(|p| p.ships.last()).map(|s| s.id) else {
            return false;
        };
        self.submit(Action::BuyEquipment {
            equipment_id: laser.to_string(),
            ship_id,
        })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Metrics recorded so far.
    #[must_use]
    pub fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    /// Replay of everything dispatched so far.
    #[must_use]
    pub fn replay(&self) -> Replay {
        Replay::record(&self.sim)
    }

    /// Close the game and return its metrics.
    #[must_use]
    pub fn finish(mut self) -> GameMetrics {
        self.metrics.finalize(self.sim.state(), self.sim.state_hash());
        tracing::info!(
            scenario = %self.metrics.scenario,
            seed = self.metrics.seed,
            turns = self.metrics.turns_played,
            hash = format_args!("{:016x}", self.metrics.final_state_hash),
            "Game finished"
        );
        self.metrics
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Final state hash of every run.
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// Whether every run ended on the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Play the same scenario `runs` times in parallel and collect the final
/// state hashes.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> Result<VerifyReport> {
    let hashes = (0..runs)
        .into_par_iter()
        .map(|_| HeadlessRunner::run(scenario).map(|m| m.final_state_hash))
        .collect::<Result<Vec<u64>>>()?;
    Ok(VerifyReport { hashes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use belt_core::components::Resource;
    use belt_core::config::GameConfig;
    use belt_core::diplomacy::{AgreementTerms, DiplomaticProposal};

    fn scenario(turns: u32) -> Scenario {
        Scenario::duel().with_seed(5).with_turns(turns)
    }

    #[test]
    fn test_first_turn_buys_and_assigns() {
        let mut runner = HeadlessRunner::new(&scenario(1)).unwrap();
        let turn = runner.play_turn();

        // 200 starting credits buy one prospector with a basic laser.
        assert_eq!(turn.fleet_size, 2);
        assert_eq!(turn.credits, 50);
        assert_eq!(turn.actions_rejected, 0);
        let player = runner.simulation().state().player();
        assert!(player.ships.iter().all(|s| s.equipment.mining.len() == 1));
    }

    #[test]
    fn test_idle_ships_go_to_richest_asteroid() {
        let sim = Simulation::new(GameConfig::duel(), 8).unwrap();
        let state = sim.state();
        let richest = state
            .asteroids
            .iter()
            .filter(|a| !a.is_depleted())
            .max_by_key(|a| (a.remaining_value(), Reverse(a.id)))
            .map(|a| a.id);

        let assignments = mining_assignments(state);
        assert_eq!(assignments.len(), 1);
        match &assignments[0] {
            Action::AssignShip { asteroid_id, .. } => assert_eq!(Some(*asteroid_id), richest),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_cargo_sold_at_market_price() {
        let sim = Simulation::new(GameConfig::duel(), 2).unwrap();
        let mut state = sim.state().clone();
        let player_id = state.player_id;
        state
            .corporations
            .get_mut(&player_id)
            .unwrap()
            .resources
            .add(Resource::Iron, 12);

        let quote = state.market.price(Resource::Iron).unwrap().sell_price;
        assert_eq!(
            cargo_sales(&state),
            vec![Action::SellResource {
                resource: Resource::Iron,
                amount: 12,
                price: quote,
            }]
        );
    }

    #[test]
    fn test_proposal_answers() {
        let sim = Simulation::new(GameConfig::duel(), 2).unwrap();
        let mut state = sim.state().clone();
        let rival = state.ai_corporation_ids()[0];
        for (n, action) in [
            DiplomaticAction::NonAggression,
            DiplomaticAction::JointCombat,
            DiplomaticAction::Peace,
        ]
        .into_iter()
        .enumerate()
        {
            state.diplomatic_proposals.push(DiplomaticProposal {
                id: belt_core::components::ProposalId::new(100 + n as u64),
                from: rival,
                to: state.player_id,
                action,
                terms: AgreementTerms::default(),
                created_at: 1,
            });
        }

        let answers = proposal_answers(&state);
        assert!(matches!(answers[0], Action::AcceptDiplomaticProposal { .. }));
        assert!(matches!(answers[1], Action::RejectDiplomaticProposal { .. }));
        assert!(matches!(answers[2], Action::AcceptDiplomaticProposal { .. }));
    }

    #[test]
    fn test_autopilot_saves_for_dock() {
        let sim = Simulation::new(GameConfig::duel().with_starting_credits(1000), 1).unwrap();
        let rules = sim.rules();
        let mut player = sim.state().player().clone();
        let autopilot = Autopilot {
            dock_after_ships: 1,
            ..Default::default()
        };
        assert_eq!(
            autopilot.next_fleet_move(&player, rules),
            Some(FleetMove::UpgradeDock)
        );

        player.has_advanced_space_dock = true;
        assert_eq!(
            autopilot.next_fleet_move(&player, rules),
            Some(FleetMove::Commission {
                hull: ShipClass::Harvester,
                laser: "advanced-mining-laser",
            })
        );

        player.credits = 399;
        assert_eq!(autopilot.next_fleet_move(&player, rules), None);
    }

    #[test]
    fn test_run_is_reproducible() {
        let first = HeadlessRunner::run(&scenario(15)).unwrap();
        let second = HeadlessRunner::run(&scenario(15)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.turns_played, 15);
        assert_eq!(first.corporations.len(), 2);
        assert!(first.total_mined() > 0);
    }

    #[test]
    fn test_runner_replay_verifies() {
        let mut runner = HeadlessRunner::new(&scenario(6)).unwrap();
        runner.play(6);
        let replay = runner.replay();
        assert_eq!(replay.final_turn, 7);
        replay.verify().unwrap();
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&scenario(5), 3).unwrap();
        assert_eq!(report.hashes.len(), 3);
        assert!(report.is_deterministic());

        let diverged = VerifyReport {
            hashes: vec![1, 1, 2],
        };
        assert!(!diverged.is_deterministic());
    }

    #[test]
    fn test_invalid_scenario_fails_to_start() {
        let mut broken = scenario(5);
        broken.config.max_energy = 0;
        assert!(verify_determinism(&broken, 2).is_err());
    }
}

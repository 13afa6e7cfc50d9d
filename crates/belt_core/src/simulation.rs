//! Action dispatch and the end-of-turn pipeline.
//!
//! [`apply_action`] is the single mutation surface: it clones the input
//! state, routes the action to its resolver and returns either the mutated
//! clone or, when the resolver rejects the action, an untouched copy of the
//! input. [`Simulation`] wraps a state with its rules, seeded random source
//! and action history.
//!
//! # End-of-turn order
//!
//! 1. **Mining** - every corporation's assigned ships and the player's card
//!    operations, asteroid by asteroid; then replenishment
//! 2. **Construction** - build queue advance, completed ships delivered
//! 3. **Traders** - countdown, departures, possible arrival
//! 4. **AI** - one strategic move per AI corporation
//! 5. **Upkeep** - completed combats pruned
//! 6. **Log** - one [`GameLog`] entry for the turn
//! 7. **Clock** - energy restored, turn advanced, market re-quoted,
//!    agreements past their duration completed

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use rand::Rng;

use crate::action::Action;
use crate::ai::{decide_strategy, StrategicDecision};
use crate::cards::{self, CardHandlerRegistry};
use crate::combat;
use crate::components::{
    AgreementId, CorporationId, IdAllocator, ResourceLedger, ShipId, TraderId,
};
use crate::config::GameConfig;
use crate::data::Catalog;
use crate::diplomacy;
use crate::economy::{self, assigned_mining_power, resolve_mining, resolve_mining_power};
use crate::error::{ActionError, ActionResult, EntityKind, GameError, Result};
use crate::factories::{generate_asteroids, generate_trader, new_game};
use crate::fleet::{self, Ship};
use crate::rng::{chance, seeded_rng, GameRng};
use crate::state::{Corporation, GameLog, GameState};

/// Everything that shapes a game besides its state: tunables, reference
/// data and card behavior.
#[derive(Debug, Clone)]
pub struct Ruleset {
    /// Tunable constants.
    pub config: GameConfig,
    /// Reference data.
    pub catalog: Catalog,
    /// Card id → behavior.
    pub card_handlers: CardHandlerRegistry,
}

impl Ruleset {
    /// Rules with the built-in card handlers.
    #[must_use]
    pub fn new(config: GameConfig, catalog: Catalog) -> Self {
        Self {
            config,
            catalog,
            card_handlers: CardHandlerRegistry::standard(),
        }
    }

    /// Default configuration and built-in catalog.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(GameConfig::default(), Catalog::standard())
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::standard()
    }
}

/// What happened during one END_TURN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    /// The turn that ended.
    pub turn: u32,
    /// Resources mined per corporation.
    pub mined: BTreeMap<CorporationId, ResourceLedger>,
    /// Ships delivered by the build queue.
    pub ships_completed: Vec<ShipId>,
    /// Asteroids generated by replenishment.
    pub asteroids_spawned: usize,
    /// Traders that arrived.
    pub traders_arrived: Vec<TraderId>,
    /// Traders that left.
    pub traders_departed: usize,
    /// Strategic move of every AI corporation that made one.
    pub ai_decisions: Vec<(CorporationId, StrategicDecision)>,
    /// Agreements that ran their course.
    pub agreements_expired: Vec<AgreementId>,
    /// Completed combats removed from the state.
    pub combats_pruned: usize,
}

/// Apply one action and return the next state.
///
/// Rejected actions return a state equal to the input; the rejection is
/// logged at debug level.
pub fn apply_action<R: Rng + ?Sized>(
    state: &GameState,
    action: &Action,
    rules: &Ruleset,
    rng: &mut R,
) -> GameState {
    match try_apply_action(state, action, rules, rng) {
        Ok(next) => next,
        Err(error) => {
            tracing::debug!(turn = state.turn, action = %action.kind(), %error, "Action rejected");
            state.clone()
        }
    }
}

/// Like [`apply_action`], but reports why an action was rejected.
pub fn try_apply_action<R: Rng + ?Sized>(
    state: &GameState,
    action: &Action,
    rules: &Ruleset,
    rng: &mut R,
) -> ActionResult<GameState> {
    let mut next = state.clone();
    dispatch(&mut next, action, rules, rng)?;
    Ok(next)
}

fn player_and_ids(state: &mut GameState) -> ActionResult<(&mut Corporation, &mut IdAllocator)> {
    let id = state.player_id;
    let corp = state
        .corporations
        .get_mut(&id)
        .ok_or_else(|| ActionError::missing(EntityKind::Corporation, id))?;
    Ok((corp, &mut state.ids))
}

fn dispatch<R: Rng + ?Sized>(
    state: &mut GameState,
    action: &Action,
    rules: &Ruleset,
    rng: &mut R,
) -> ActionResult {
    let config = &rules.config;
    let catalog = &rules.catalog;

    match action {
        Action::PlayCard {
            card_id,
            target_asteroid_id,
        } => cards::play_card(state, catalog, &rules.card_handlers, *card_id, *target_asteroid_id),
        Action::EndTurn => {
            run_end_turn(state, rules, rng);
            Ok(())
        }
        Action::DrawCard => cards::draw_card(state, rng),
        Action::PurchaseCard { card_id } => cards::purchase_card(state, *card_id),
        Action::RefreshShop => cards::refresh_shop(state, catalog, config, rng),
        Action::RecallMiningOperation { card_id } => cards::recall_mining_operation(state, *card_id),
        Action::SellResource {
            resource,
            amount,
            price,
        } => {
            economy::sell_resource(state.player_mut()?, *resource, *amount, *price)?;
            Ok(())
        }
        Action::BuyShip { ship_class } => {
            let (corp, ids) = player_and_ids(state)?;
            fleet::purchase_ship(corp, *ship_class, catalog, ids, rng)?;
            Ok(())
        }
        Action::SellShip { ship_id } => {
            fleet::sell_ship(state.player_mut()?, *ship_id, config.sale_refund_percent)?;
            Ok(())
        }
        Action::BuyEquipment {
            equipment_id,
            ship_id,
        } => fleet::install_equipment(state.player_mut()?, *ship_id, equipment_id, catalog),
        Action::RemoveEquipment {
            equipment_id,
            ship_id,
        } => fleet::remove_equipment(state.player_mut()?, *ship_id, equipment_id),
        Action::AssignShip {
            ship_id,
            asteroid_id,
        } => {
            let asteroid = state
                .asteroids
                .iter()
                .find(|a| a.id == *asteroid_id)
                .ok_or_else(|| ActionError::missing(EntityKind::Asteroid, asteroid_id))?;
            let corp = state
                .corporations
                .get_mut(&state.player_id)
                .ok_or_else(|| ActionError::missing(EntityKind::Corporation, state.player_id))?;
            fleet::assign_ship(corp, *ship_id, asteroid)
        }
        Action::RecallShip { ship_id } => fleet::recall_ship(state.player_mut()?, *ship_id),
        Action::UpgradeSpaceDock => {
            fleet::upgrade_space_dock(state.player_mut()?, config.advanced_dock_cost)
        }
        Action::StartShipBuild { ship_class } => {
            let (corp, ids) = player_and_ids(state)?;
            let order = fleet::start_ship_build(corp, *ship_class, catalog, ids)?;
            state.ship_build_queue.push(order);
            Ok(())
        }
        Action::TradeWithTrader {
            trader_id,
            resource,
            amount,
            total_cost,
        } => {
            let trader = state
                .traders
                .iter_mut()
                .find(|t| t.id == *trader_id)
                .ok_or_else(|| ActionError::missing(EntityKind::Trader, trader_id))?;
            let corp = state
                .corporations
                .get_mut(&state.player_id)
                .ok_or_else(|| ActionError::missing(EntityKind::Corporation, state.player_id))?;
            economy::trade_with_trader(corp, trader, *resource, *amount, *total_cost)
        }
        Action::ProposeDiplomaticAction {
            action,
            target_corporation_id,
            terms,
        } => {
            let player = state.player_id;
            diplomacy::propose(state, player, *target_corporation_id, *action, *terms, rng)?;
            Ok(())
        }
        Action::AcceptDiplomaticProposal { proposal_id } => {
            diplomacy::accept_proposal(state, *proposal_id)?;
            Ok(())
        }
        Action::RejectDiplomaticProposal { proposal_id } => {
            diplomacy::reject_proposal(state, *proposal_id)
        }
        Action::InitiateCombat {
            attacker_id,
            defender_id,
            attacker_ships,
            defender_ships,
        } => {
            combat::initiate_combat(state, *attacker_id, *defender_id, attacker_ships, defender_ships)?;
            Ok(())
        }
        Action::PerformCombatAction {
            combat_id,
            action,
            ship_ids,
        } => combat::perform_combat_action(state, *combat_id, *action, ship_ids, config),
    }
}

/// Run the end-of-turn pipeline in place.
pub fn run_end_turn<R: Rng + ?Sized>(state: &mut GameState, rules: &Ruleset, rng: &mut R) -> TurnReport {
    let config = &rules.config;
    let mut report = TurnReport {
        turn: state.turn,
        ..TurnReport::default()
    };
    let credits_before = state.corporation(state.player_id).map_or(0, |c| c.credits);

    // 1. Mining
    report.mined = run_mining(state, config.mining_efficiency_percent);
    close_exhausted_operations(state);
    if state.active_asteroid_count() < config.min_active_asteroids {
        let fresh = generate_asteroids(
            config.replenish_asteroids,
            config,
            &rules.catalog,
            &mut state.ids,
            rng,
        );
        report.asteroids_spawned = fresh.len();
        state.asteroids.extend(fresh);
    }

    // 2. Construction
    let advance = fleet::advance_build_queue(
        &state.ship_build_queue,
        &state.corporations,
        &rules.catalog,
        &mut state.ids,
        rng,
    );
    state.ship_build_queue = advance.remaining;
    let mut completion_messages = Vec::new();
    for ship in advance.completed {
        if let Some(owner) = state.corporations.get_mut(&ship.owner_id) {
            if owner.is_player {
                completion_messages.push(format!("{} ({}) left the shipyard", ship.name, ship.class));
            }
            report.ships_completed.push(ship.id);
            owner.ships.push(ship);
        }
    }

    // 3. Traders
    for trader in &mut state.traders {
        trader.turns_remaining = trader.turns_remaining.saturating_sub(1);
    }
    let before = state.traders.len();
    state.traders.retain(|t| t.turns_remaining > 0);
    report.traders_departed = before - state.traders.len();
    if chance(rng, config.trader_spawn_chance) {
        let trader = generate_trader(state.ids.allocate(), rng);
        report.traders_arrived.push(trader.id);
        state.traders.push(trader);
    }

    // 4. AI
    for corp_id in state.ai_corporation_ids() {
        let decision = decide_strategy(state, corp_id, config);
        if decision == StrategicDecision::Idle {
            continue;
        }
        let applied = match &decision {
            StrategicDecision::Propose {
                target,
                action,
                terms,
            } => diplomacy::propose(state, corp_id, *target, *action, *terms, rng).map(drop),
            StrategicDecision::BreakAgreement { agreement } => {
                diplomacy::break_agreement(state, corp_id, *agreement)
            }
            StrategicDecision::Idle => Ok(()),
        };
        match applied {
            Ok(()) => {
                tracing::debug!(corporation = %corp_id, ?decision, "AI decision applied");
                report.ai_decisions.push((corp_id, decision));
            }
            Err(error) => {
                tracing::debug!(corporation = %corp_id, ?decision, %error, "AI decision dropped");
            }
        }
    }

    // 5. Upkeep
    report.combats_pruned = combat::prune_completed_combats(state);

    // 6. Log
    let player_mined = report
        .mined
        .get(&state.player_id)
        .cloned()
        .unwrap_or_default();
    let credits_after = state.corporation(state.player_id).map_or(0, |c| c.credits);
    let credit_change = credits_after as i64 - credits_before as i64;
    let mut messages = vec![format!("Turn {} ended", state.turn)];
    for (resource, amount) in player_mined.iter() {
        messages.push(format!("Mined {amount} {resource}"));
    }
    messages.extend(completion_messages);
    let log = GameLog {
        id: state.ids.allocate(),
        turn: state.turn,
        messages,
        resource_changes: (!player_mined.is_empty()).then_some(player_mined),
        credit_change: (credit_change != 0).then_some(credit_change),
    };
    state.game_logs.push(log);

    // 7. Clock
    state.energy = state.max_energy;
    state.turn += 1;
    state
        .market
        .refresh(&rules.catalog, state.turn, config.market_markup, rng);
    report.agreements_expired = diplomacy::expire_agreements(state);

    tracing::info!(
        turn = report.turn,
        ships_completed = report.ships_completed.len(),
        ai_decisions = report.ai_decisions.len(),
        "Turn ended"
    );
    report
}

/// Mine every asteroid once. Corporations mine in id order, so on a
/// shared asteroid the lower id works the fuller deposit.
fn run_mining(state: &mut GameState, efficiency_percent: u32) -> BTreeMap<CorporationId, ResourceLedger> {
    let mut mined: BTreeMap<CorporationId, ResourceLedger> = BTreeMap::new();
    let player_id = state.player_id;

    for asteroid in &mut state.asteroids {
        let card_power: u32 = state
            .active_mining_operations
            .iter()
            .filter(|op| op.asteroid_id == asteroid.id)
            .map(|op| op.mining_power)
            .sum();

        for corp in state.corporations.values_mut() {
            if asteroid.is_depleted() {
                break;
            }
            let ships: Vec<&Ship> = corp
                .ships
                .iter()
                .filter(|s| s.assigned_asteroid_id == Some(asteroid.id))
                .collect();
            let outcome = if corp.id == player_id && card_power > 0 {
                let power = assigned_mining_power(asteroid, &ships) + card_power;
                resolve_mining_power(asteroid, power, efficiency_percent)
            } else {
                resolve_mining(asteroid, &ships, efficiency_percent)
            };
            if outcome.asteroid == *asteroid {
                continue;
            }
            *asteroid = outcome.asteroid;
            corp.resources.merge(&outcome.yields);
            mined.entry(corp.id).or_default().merge(&outcome.yields);
        }

        if asteroid.is_depleted() {
            for corp in state.corporations.values_mut() {
                for ship in &mut corp.ships {
                    if ship.assigned_asteroid_id == Some(asteroid.id) {
                        ship.assigned_asteroid_id = None;
                    }
                }
            }
        }
    }

    mined.retain(|_, ledger| !ledger.is_empty());
    mined
}

/// Age card operations; those on exhausted or vanished asteroids end and
/// their cards go to the discard pile.
fn close_exhausted_operations(state: &mut GameState) {
    let mut still_running = Vec::with_capacity(state.active_mining_operations.len());
    for mut operation in std::mem::take(&mut state.active_mining_operations) {
        let alive = state
            .asteroids
            .iter()
            .any(|a| a.id == operation.asteroid_id && !a.is_depleted());
        if alive {
            operation.turns_active += 1;
            still_running.push(operation);
        } else {
            state.discard_pile.push(operation.card);
        }
    }
    state.active_mining_operations = still_running;
}

/// A running game: state, rules, seeded randomness and the actions that
/// produced it.
///
/// Two simulations built with the same configuration and seed that see
/// the same actions end in identical states.
#[derive(Debug, Clone)]
pub struct Simulation {
    rules: Ruleset,
    state: GameState,
    rng: GameRng,
    seed: u64,
    history: Vec<Action>,
}

impl Simulation {
    /// Start a new game.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the configuration does not
    /// validate.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_rules(Ruleset::new(config, Catalog::standard()), seed))
    }

    /// Start a new game under explicit rules.
    #[must_use]
    pub fn with_rules(rules: Ruleset, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let state = new_game(&rules.config, &rules.catalog, &mut rng);
        tracing::debug!(seed, corporations = state.corporations.len(), "Simulation created");
        Self {
            rules,
            state,
            rng,
            seed,
            history: Vec::new(),
        }
    }

    /// Apply an action. Returns `true` if the state changed.
    ///
    /// Every action is recorded, rejected ones included.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let next = apply_action(&self.state, &action, &self.rules, &mut self.rng);
        let changed = next != self.state;
        self.state = next;
        self.history.push(action);
        changed
    }

    /// Run the end-of-turn pipeline.
    pub fn end_turn(&mut self) -> TurnReport {
        let report = run_end_turn(&mut self.state, &self.rules, &mut self.rng);
        self.history.push(Action::EndTurn);
        report
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The rules in force.
    #[must_use]
    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    /// Current turn.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.state.turn
    }

    /// Seed the game started from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Every action dispatched so far.
    #[must_use]
    pub fn history(&self) -> &[Action] {
        &self.history
    }

    /// Encode the state with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EncodeError`] if encoding fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.state).map_err(|e| GameError::EncodeError(e.to_string()))
    }

    /// Hash of the current state, for desync detection.
    ///
    /// Covers every field of the state, floats included, through its
    /// bincode encoding.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        state_hash(&self.state)
    }
}

/// Hash of a state; equal states hash equal.
#[must_use]
pub fn state_hash(state: &GameState) -> u64 {
    let mut hasher = DefaultHasher::new();
    match bincode::serialize(state) {
        Ok(bytes) => bytes.hash(&mut hasher),
        Err(error) => {
            tracing::warn!(%error, "State encoding failed; hashing turn only");
            state.turn.hash(&mut hasher);
        }
    }
    hasher.finish()
}

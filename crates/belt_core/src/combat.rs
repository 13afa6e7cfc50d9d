//! Tactical combat between two fleets.
//!
//! Combat runs on copies of the ships involved. Both sides act at once:
//! every attack in a round is computed against the ship lists as they stood
//! before the round, then destroyed ships are removed. When either list
//! empties the combat completes and [`settle_combat`] writes the results
//! back to the corporations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ai::choose_combat_action;
use crate::components::{CombatId, CorporationId, ResourceLedger, ShipId};
use crate::config::GameConfig;
use crate::error::{ActionError, ActionResult, EntityKind};
use crate::fleet::Ship;
use crate::math::Fixed;
use crate::state::GameState;

/// Minimum damage a positive hit deals after defense. Hits that defense
/// would absorb entirely still land this much, so mutual attack always ends.
pub const MIN_DAMAGE: Fixed = Fixed::ONE;

/// What a ship does this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatAction {
    /// Fire all weapons.
    Attack,
    /// Hold fire; shields count one and a half times.
    Defend,
    /// Neither fire nor brace.
    Retreat,
}

/// Combat lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatStatus {
    /// Rounds are still being fought.
    Active,
    /// Terminal.
    Completed,
}

/// Spoils moved from loser to winner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CombatRewards {
    /// Credits.
    pub credits: u64,
    /// Resources.
    pub resources: ResourceLedger,
}

/// A fight in progress or just finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    /// Identifier.
    pub id: CombatId,
    /// Attacking corporation.
    pub attacker_id: CorporationId,
    /// Defending corporation.
    pub defender_id: CorporationId,
    /// Live copies of the attacker's ships.
    pub attacker_ships: Vec<Ship>,
    /// Live copies of the defender's ships.
    pub defender_ships: Vec<Ship>,
    /// Rounds fought.
    pub turn: u32,
    /// Lifecycle status.
    pub status: CombatStatus,
    /// Winner, once completed.
    pub winner: Option<CorporationId>,
    /// Spoils, once settled.
    pub rewards: Option<CombatRewards>,
    /// Ships destroyed so far, both sides.
    #[serde(default)]
    pub destroyed_ships: Vec<ShipId>,
}

impl CombatState {
    /// Whether a ship is still fighting on either side.
    #[must_use]
    pub fn contains_ship(&self, id: ShipId) -> bool {
        self.attacker_ships
            .iter()
            .chain(&self.defender_ships)
            .any(|s| s.id == id)
    }

    /// Whether a corporation takes part.
    #[must_use]
    pub fn involves(&self, corp: CorporationId) -> bool {
        self.attacker_id == corp || self.defender_id == corp
    }
}

/// Per-ship orders for one side.
pub type CombatOrders = BTreeMap<ShipId, CombatAction>;

fn effective_defense(ship: &Ship, action: Option<CombatAction>) -> Fixed {
    let shield = Fixed::from_num(ship.shield_power());
    if action == Some(CombatAction::Defend) {
        shield * Fixed::from_num(3) / Fixed::from_num(2)
    } else {
        shield
    }
}

/// Damage one side's attacks deal to the other, computed from pre-round
/// lists. Returns the targets with updated health.
fn resolve_volley(
    shooters: &[Ship],
    shooter_orders: &CombatOrders,
    targets: &[Ship],
    target_orders: &CombatOrders,
) -> Vec<Ship> {
    let mut hit = targets.to_vec();
    if targets.is_empty() {
        return hit;
    }
    let split = Fixed::from_num(targets.len());

    for shooter in shooters {
        if shooter_orders.get(&shooter.id) != Some(&CombatAction::Attack) {
            continue;
        }
        let damage = Fixed::from_num(shooter.weapon_power()) / split;
        if damage <= Fixed::ZERO {
            continue;
        }
        for target in &mut hit {
            let defense = effective_defense(target, target_orders.get(&target.id).copied());
            let final_damage = (damage - defense).max(damage.min(MIN_DAMAGE));
            target.health = (target.health - final_damage).max(Fixed::ZERO);
        }
    }
    hit
}

/// Fight one round.
///
/// Ships missing from an order map neither attack nor defend. A completed
/// combat is returned unchanged.
#[must_use]
pub fn calculate_combat_round(
    combat: &CombatState,
    attacker_orders: &CombatOrders,
    defender_orders: &CombatOrders,
) -> CombatState {
    let mut next = combat.clone();
    if combat.status == CombatStatus::Completed {
        return next;
    }

    let defenders = resolve_volley(
        &combat.attacker_ships,
        attacker_orders,
        &combat.defender_ships,
        defender_orders,
    );
    let attackers = resolve_volley(
        &combat.defender_ships,
        defender_orders,
        &combat.attacker_ships,
        attacker_orders,
    );

    for ship in attackers.iter().chain(&defenders) {
        if ship.is_destroyed() {
            next.destroyed_ships.push(ship.id);
        }
    }
    next.attacker_ships = attackers.into_iter().filter(|s| !s.is_destroyed()).collect();
    next.defender_ships = defenders.into_iter().filter(|s| !s.is_destroyed()).collect();
    next.turn += 1;

    // Mutual destruction goes to the defender.
    if next.attacker_ships.is_empty() {
        next.status = CombatStatus::Completed;
        next.winner = Some(combat.defender_id);
    } else if next.defender_ships.is_empty() {
        next.status = CombatStatus::Completed;
        next.winner = Some(combat.attacker_id);
    }
    next
}

/// Orders for a side: listed ships take `action`, the rest follow the
/// per-ship heuristic.
#[must_use]
pub fn side_orders(ships: &[Ship], listed: &BTreeSet<ShipId>, action: CombatAction) -> CombatOrders {
    ships
        .iter()
        .map(|ship| {
            let chosen = if listed.contains(&ship.id) {
                action
            } else {
                choose_combat_action(ship)
            };
            (ship.id, chosen)
        })
        .collect()
}

fn collect_ships(
    state: &GameState,
    owner: CorporationId,
    ids: &[ShipId],
) -> ActionResult<Vec<Ship>> {
    if ids.is_empty() {
        return Err(ActionError::unmet("a combat side needs at least one ship"));
    }
    let corp = state.require_corporation(owner)?;
    let mut seen = BTreeSet::new();
    let mut ships = Vec::with_capacity(ids.len());
    for &id in ids {
        if !seen.insert(id) {
            return Err(ActionError::unmet(format!("ship {id} listed twice")));
        }
        let ship = corp
            .ship(id)
            .ok_or_else(|| ActionError::missing(EntityKind::Ship, id))?;
        let busy = state
            .active_combats
            .iter()
            .any(|c| c.status == CombatStatus::Active && c.contains_ship(id));
        if busy {
            return Err(ActionError::unmet(format!("ship {id} is already in combat")));
        }
        ships.push(ship.clone());
    }
    Ok(ships)
}

/// Open a combat between chosen ships of two corporations.
pub fn initiate_combat(
    state: &mut GameState,
    attacker_id: CorporationId,
    defender_id: CorporationId,
    attacker_ships: &[ShipId],
    defender_ships: &[ShipId],
) -> ActionResult<CombatId> {
    if attacker_id == defender_id {
        return Err(ActionError::unmet("a corporation cannot fight itself"));
    }
    let attackers = collect_ships(state, attacker_id, attacker_ships)?;
    let defenders = collect_ships(state, defender_id, defender_ships)?;

    let id = state.ids.allocate();
    state.active_combats.push(CombatState {
        id,
        attacker_id,
        defender_id,
        attacker_ships: attackers,
        defender_ships: defenders,
        turn: 0,
        status: CombatStatus::Active,
        winner: None,
        rewards: None,
        destroyed_ships: Vec::new(),
    });
    tracing::info!(combat = %id, attacker = %attacker_id, defender = %defender_id, "Combat started");
    Ok(id)
}

/// Fight one round of an active combat on the player's orders.
///
/// `ship_ids` must name the player's own ships in this combat; they take
/// `action` and the rest of the player's side follows the heuristic. The
/// opposing side always acts on the heuristic.
pub fn perform_combat_action(
    state: &mut GameState,
    combat_id: CombatId,
    action: CombatAction,
    ship_ids: &[ShipId],
    config: &GameConfig,
) -> ActionResult {
    let player = state.player_id;
    let index = state
        .active_combats
        .iter()
        .position(|c| c.id == combat_id)
        .ok_or_else(|| ActionError::missing(EntityKind::Combat, combat_id))?;
    let combat = &state.active_combats[index];
    if combat.status == CombatStatus::Completed {
        return Err(ActionError::unmet(format!("combat {combat_id} is over")));
    }
    let player_ships: &[Ship] = if combat.attacker_id == player {
        &combat.attacker_ships
    } else if combat.defender_id == player {
        &combat.defender_ships
    } else {
        &[]
    };
    for id in ship_ids {
        if !combat.contains_ship(*id) {
            return Err(ActionError::missing(EntityKind::Ship, id));
        }
        if !player_ships.iter().any(|s| s.id == *id) {
            return Err(ActionError::unmet(format!("ship {id} does not take orders from the player")));
        }
    }

    let listed: BTreeSet<ShipId> = ship_ids.iter().copied().collect();
    let orders_for = |corp: CorporationId, ships: &[Ship]| {
        if corp == player {
            side_orders(ships, &listed, action)
        } else {
            side_orders(ships, &BTreeSet::new(), action)
        }
    };
    let attacker_orders = orders_for(combat.attacker_id, &combat.attacker_ships);
    let defender_orders = orders_for(combat.defender_id, &combat.defender_ships);
    let mut next = calculate_combat_round(combat, &attacker_orders, &defender_orders);

    if next.status == CombatStatus::Completed {
        settle_combat(state, &mut next, config)?;
    }
    state.active_combats[index] = next;
    Ok(())
}

/// Write a finished combat back to the corporations.
///
/// Destroyed ships leave their owners' fleets and survivors keep their
/// damage. The loser takes corporation damage per ship lost and hands a
/// share of its credits and resources to the winner.
pub fn settle_combat(state: &mut GameState, combat: &mut CombatState, config: &GameConfig) -> ActionResult {
    let Some(winner) = combat.winner else {
        return Err(ActionError::unmet("combat has no winner yet"));
    };
    let loser = if winner == combat.attacker_id {
        combat.defender_id
    } else {
        combat.attacker_id
    };

    let survivors: BTreeMap<ShipId, Fixed> = combat
        .attacker_ships
        .iter()
        .chain(&combat.defender_ships)
        .map(|s| (s.id, s.health))
        .collect();
    let mut loser_losses = 0u32;
    for corp_id in [combat.attacker_id, combat.defender_id] {
        let corp = state.require_corporation_mut(corp_id)?;
        let before = corp.ships.len();
        corp.ships.retain(|s| !combat.destroyed_ships.contains(&s.id));
        if corp_id == loser {
            loser_losses = (before - corp.ships.len()) as u32;
        }
        for ship in &mut corp.ships {
            if let Some(&health) = survivors.get(&ship.id) {
                ship.health = health;
            }
        }
    }

    let loser_corp = state.require_corporation_mut(loser)?;
    loser_corp.take_damage(config.defeat_damage_per_ship.saturating_mul(loser_losses));
    let credits = loser_corp.credits.saturating_mul(u64::from(config.combat_reward_percent)) / 100;
    let resources = loser_corp.resources.scaled(config.combat_reward_percent);
    loser_corp.spend(credits)?;
    for (resource, amount) in resources.iter() {
        loser_corp.resources.remove(resource, amount)?;
    }

    let winner_corp = state.require_corporation_mut(winner)?;
    winner_corp.earn(credits);
    winner_corp.resources.merge(&resources);

    tracing::info!(
        combat = %combat.id,
        %winner,
        %loser,
        ships_lost = loser_losses,
        credits,
        "Combat settled"
    );
    combat.rewards = Some(CombatRewards { credits, resources });
    Ok(())
}

/// Drop completed combats.
pub fn prune_completed_combats(state: &mut GameState) -> usize {
    let before = state.active_combats.len();
    state
        .active_combats
        .retain(|c| c.status == CombatStatus::Active);
    before - state.active_combats.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Catalog;
    use crate::factories::create_ship;
    use crate::components::ShipClass;
    use crate::rng::seeded_rng;

    fn ship(id: u64, owner: u64, weapon: u32, shield: u32, health: i32) -> Ship {
        let catalog = Catalog::standard();
        let template = catalog.ship(ShipClass::Destructor).unwrap();
        let mut ship = create_ship(
            template,
            ShipId::new(id),
            CorporationId::new(owner),
            "Owner",
            &mut seeded_rng(id),
        );
        let mut cannon = catalog.equipment("plasma-cannon").unwrap().clone();
        cannon.power = weapon;
        let mut shield_item = catalog.equipment("advanced-shield").unwrap().clone();
        shield_item.power = shield;
        if weapon > 0 {
            ship.equipment.weapon.push(cannon);
        }
        if shield > 0 {
            ship.equipment.defense.push(shield_item);
        }
        ship.health = Fixed::from_num(health);
        ship.max_health = Fixed::from_num(health);
        ship
    }

    fn combat(attackers: Vec<Ship>, defenders: Vec<Ship>) -> CombatState {
        CombatState {
            id: CombatId::new(1),
            attacker_id: CorporationId::new(1),
            defender_id: CorporationId::new(2),
            attacker_ships: attackers,
            defender_ships: defenders,
            turn: 0,
            status: CombatStatus::Active,
            winner: None,
            rewards: None,
            destroyed_ships: Vec::new(),
        }
    }

    fn all(ships: &[Ship], action: CombatAction) -> CombatOrders {
        ships.iter().map(|s| (s.id, action)).collect()
    }

    #[test]
    fn test_single_target_takes_power_minus_shield() {
        let c = combat(vec![ship(1, 1, 30, 0, 100)], vec![ship(2, 2, 0, 10, 100)]);
        let orders_a = all(&c.attacker_ships, CombatAction::Attack);
        let orders_d = all(&c.defender_ships, CombatAction::Attack);
        let next = calculate_combat_round(&c, &orders_a, &orders_d);
        assert_eq!(next.defender_ships[0].health, Fixed::from_num(80));
        assert_eq!(next.turn, 1);
    }

    #[test]
    fn test_defend_multiplies_shield() {
        let c = combat(vec![ship(1, 1, 30, 0, 100)], vec![ship(2, 2, 0, 10, 100)]);
        let orders_a = all(&c.attacker_ships, CombatAction::Attack);
        let orders_d = all(&c.defender_ships, CombatAction::Defend);
        let next = calculate_combat_round(&c, &orders_a, &orders_d);
        assert_eq!(next.defender_ships[0].health, Fixed::from_num(85));
    }

    #[test]
    fn test_damage_splits_across_targets() {
        let c = combat(
            vec![ship(1, 1, 40, 0, 100)],
            vec![ship(2, 2, 0, 0, 100), ship(3, 2, 0, 0, 100)],
        );
        let next = calculate_combat_round(
            &c,
            &all(&c.attacker_ships, CombatAction::Attack),
            &CombatOrders::new(),
        );
        for target in &next.defender_ships {
            assert_eq!(target.health, Fixed::from_num(80));
        }
    }

    #[test]
    fn test_simultaneous_resolution_uses_pre_round_lists() {
        // Both one-shot each other; the defender's shot still lands.
        let c = combat(vec![ship(1, 1, 50, 0, 10)], vec![ship(2, 2, 50, 0, 10)]);
        let next = calculate_combat_round(
            &c,
            &all(&c.attacker_ships, CombatAction::Attack),
            &all(&c.defender_ships, CombatAction::Attack),
        );
        assert!(next.attacker_ships.is_empty());
        assert!(next.defender_ships.is_empty());
        assert_eq!(next.status, CombatStatus::Completed);
        assert_eq!(next.winner, Some(CorporationId::new(2)));
        assert_eq!(next.destroyed_ships.len(), 2);
    }

    #[test]
    fn test_attacker_wins_when_defenders_gone() {
        let c = combat(vec![ship(1, 1, 50, 0, 100)], vec![ship(2, 2, 0, 0, 10)]);
        let next = calculate_combat_round(
            &c,
            &all(&c.attacker_ships, CombatAction::Attack),
            &CombatOrders::new(),
        );
        assert_eq!(next.winner, Some(CorporationId::new(1)));
        let again = calculate_combat_round(&next, &CombatOrders::new(), &CombatOrders::new());
        assert_eq!(again, next);
    }

    #[test]
    fn test_heavy_shields_still_take_minimum_damage() {
        let c = combat(vec![ship(1, 1, 5, 100, 3)], vec![ship(2, 2, 5, 100, 3)]);
        let mut current = c;
        for _ in 0..3 {
            current = calculate_combat_round(
                &current,
                &all(&current.attacker_ships, CombatAction::Attack),
                &all(&current.defender_ships, CombatAction::Attack),
            );
        }
        assert_eq!(current.status, CombatStatus::Completed);
    }

    #[test]
    fn test_absorbed_hit_deals_floor_damage() {
        let c = combat(vec![ship(1, 1, 5, 0, 100)], vec![ship(2, 2, 0, 10, 100)]);
        let next = calculate_combat_round(
            &c,
            &all(&c.attacker_ships, CombatAction::Attack),
            &CombatOrders::new(),
        );
        assert_eq!(next.defender_ships[0].health, Fixed::from_num(100) - MIN_DAMAGE);

        // A fractional hit is not rounded up to the floor.
        let c = combat(
            vec![ship(1, 1, 1, 0, 100)],
            vec![ship(2, 2, 0, 10, 100), ship(3, 2, 0, 10, 100)],
        );
        let next = calculate_combat_round(
            &c,
            &all(&c.attacker_ships, CombatAction::Attack),
            &CombatOrders::new(),
        );
        assert_eq!(next.defender_ships[0].health, Fixed::from_num(100) - Fixed::from_num(0.5));
    }

    #[test]
    fn test_retreat_neither_fires_nor_braces() {
        let c = combat(vec![ship(1, 1, 30, 0, 100)], vec![ship(2, 2, 30, 10, 100)]);
        let next = calculate_combat_round(
            &c,
            &all(&c.attacker_ships, CombatAction::Attack),
            &all(&c.defender_ships, CombatAction::Retreat),
        );
        assert_eq!(next.defender_ships[0].health, Fixed::from_num(80));
        assert_eq!(next.attacker_ships[0].health, Fixed::from_num(100));
    }
}

//! Fleet and construction management.
//!
//! Ship purchase and sale, equipment attach/detach, asteroid assignment,
//! the Advanced Space Dock upgrade and build-queue progression. Every
//! operation either completes or returns an [`ActionError`] without having
//! touched the corporation.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{
    AsteroidId, AsteroidType, BuildOrderId, CorporationId, IdAllocator, RangeClass, ShipClass,
    ShipId, SlotType, SpeedClass,
};
use crate::data::{Catalog, Equipment, ShipTemplate, SlotCapacity};
use crate::economy::Asteroid;
use crate::error::{ActionError, ActionResult, EntityKind};
use crate::factories::create_ship;
use crate::math::{fixed_serde, Fixed};
use crate::state::Corporation;

/// Equipment installed on a ship, per slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InstalledEquipment {
    /// Mining slot contents.
    pub mining: Vec<Equipment>,
    /// Defense slot contents.
    pub defense: Vec<Equipment>,
    /// Weapon slot contents.
    pub weapon: Vec<Equipment>,
}

impl InstalledEquipment {
    /// Contents of one slot.
    #[must_use]
    pub fn slot(&self, slot: SlotType) -> &[Equipment] {
        match slot {
            SlotType::Mining => &self.mining,
            SlotType::Defense => &self.defense,
            SlotType::Weapon => &self.weapon,
        }
    }

    fn slot_mut(&mut self, slot: SlotType) -> &mut Vec<Equipment> {
        match slot {
            SlotType::Mining => &mut self.mining,
            SlotType::Defense => &mut self.defense,
            SlotType::Weapon => &mut self.weapon,
        }
    }
}

/// A ship owned by a corporation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    /// Identifier.
    pub id: ShipId,
    /// Display name.
    pub name: String,
    /// Class.
    pub class: ShipClass,
    /// Price paid, basis for the sale refund.
    pub cost: u64,
    /// Maximum hull.
    #[serde(with = "fixed_serde")]
    pub max_health: Fixed,
    /// Current hull.
    #[serde(with = "fixed_serde")]
    pub health: Fixed,
    /// Slot capacities.
    pub slots: SlotCapacity,
    /// Installed equipment; each slot list is at most its capacity long.
    pub equipment: InstalledEquipment,
    /// Asteroid this ship is mining, if any.
    pub assigned_asteroid_id: Option<AsteroidId>,
    /// Speed class.
    pub speed: SpeedClass,
    /// Range class.
    pub range: RangeClass,
    /// Carrier bay size.
    pub carrier_capacity: Option<u32>,
    /// Ships docked in the carrier bay.
    #[serde(default)]
    pub carried_ships: Vec<ShipId>,
    /// Owning corporation.
    pub owner_id: CorporationId,
    /// Owning corporation's name.
    pub owner_name: String,
}

impl Ship {
    /// Total weapon power.
    #[must_use]
    pub fn weapon_power(&self) -> u32 {
        self.equipment.weapon.iter().map(Equipment::weapon_power).sum()
    }

    /// Total shield power.
    #[must_use]
    pub fn shield_power(&self) -> u32 {
        self.equipment.defense.iter().map(Equipment::shield_power).sum()
    }

    /// Total mining power against an asteroid type.
    #[must_use]
    pub fn mining_power_against(&self, asteroid_type: AsteroidType) -> u32 {
        self.equipment
            .mining
            .iter()
            .map(|e| e.mining_power_against(asteroid_type))
            .sum()
    }

    /// Whether the hull is gone.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.health <= Fixed::ZERO
    }
}

/// A ship under construction. Its cost was paid when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipBuildOrder {
    /// Identifier.
    pub id: BuildOrderId,
    /// Corporation that receives the ship.
    pub owner_id: CorporationId,
    /// Class being built.
    pub ship_class: ShipClass,
    /// Turns left.
    pub turns_remaining: u32,
    /// Turns the order took in total.
    pub total_turns: u32,
}

fn require_template(catalog: &Catalog, class: ShipClass) -> ActionResult<&ShipTemplate> {
    catalog
        .ship(class)
        .ok_or_else(|| ActionError::missing(EntityKind::CatalogEntry, class))
}

fn check_dock(corp: &Corporation, template: &ShipTemplate) -> ActionResult {
    if template.requires_advanced_dock && !corp.has_advanced_space_dock {
        return Err(ActionError::unmet(format!(
            "{} requires an Advanced Space Dock",
            template.class
        )));
    }
    Ok(())
}

/// Buy a ship outright.
pub fn purchase_ship<R: Rng + ?Sized>(
    corp: &mut Corporation,
    class: ShipClass,
    catalog: &Catalog,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> ActionResult<ShipId> {
    let template = require_template(catalog, class)?;
    check_dock(corp, template)?;
    corp.spend(template.cost)?;

    let ship = create_ship(template, ids.allocate(), corp.id, &corp.name, rng);
    let id = ship.id;
    corp.ships.push(ship);
    Ok(id)
}

/// Sell a ship for part of its cost. A corporation always keeps one ship.
pub fn sell_ship(corp: &mut Corporation, ship_id: ShipId, refund_percent: u32) -> ActionResult<u64> {
    let index = corp
        .ships
        .iter()
        .position(|s| s.id == ship_id)
        .ok_or_else(|| ActionError::missing(EntityKind::Ship, ship_id))?;
    if corp.ships.len() <= 1 {
        return Err(ActionError::CapacityExceeded(
            "a corporation must keep at least one ship".to_string(),
        ));
    }

    let ship = corp.ships.remove(index);
    let refund = ship.cost.saturating_mul(u64::from(refund_percent)) / 100;
    corp.earn(refund);
    Ok(refund)
}

/// Buy a catalog item and mount it on a ship.
pub fn install_equipment(
    corp: &mut Corporation,
    ship_id: ShipId,
    equipment_id: &str,
    catalog: &Catalog,
) -> ActionResult {
    let item = catalog
        .equipment(equipment_id)
        .ok_or_else(|| ActionError::missing(EntityKind::CatalogEntry, equipment_id))?;

    let ship = corp
        .ship(ship_id)
        .ok_or_else(|| ActionError::missing(EntityKind::Ship, ship_id))?;
    if !item.allows(ship.class) {
        return Err(ActionError::unmet(format!(
            "{} cannot mount {}",
            ship.class, item.id
        )));
    }
    let capacity = ship.slots.of(item.slot) as usize;
    if ship.equipment.slot(item.slot).len() >= capacity {
        return Err(ActionError::CapacityExceeded(format!(
            "{} slot of ship {} is full",
            item.slot, ship_id
        )));
    }

    corp.spend(item.cost)?;
    corp.require_ship_mut(ship_id)?
        .equipment
        .slot_mut(item.slot)
        .push(item.clone());
    Ok(())
}

/// Detach the first item with the given catalog id. No refund.
pub fn remove_equipment(corp: &mut Corporation, ship_id: ShipId, equipment_id: &str) -> ActionResult {
    let ship = corp.require_ship_mut(ship_id)?;
    for slot in [SlotType::Mining, SlotType::Defense, SlotType::Weapon] {
        let items = ship.equipment.slot_mut(slot);
        if let Some(index) = items.iter().position(|e| e.id == equipment_id) {
            items.remove(index);
            return Ok(());
        }
    }
    Err(ActionError::missing(EntityKind::CatalogEntry, equipment_id))
}

/// Send a ship to mine an asteroid. Reassigning replaces the old target.
pub fn assign_ship(corp: &mut Corporation, ship_id: ShipId, asteroid: &Asteroid) -> ActionResult {
    if asteroid.is_depleted() {
        return Err(ActionError::unmet(format!(
            "asteroid {} is exhausted",
            asteroid.id
        )));
    }
    corp.require_ship_mut(ship_id)?.assigned_asteroid_id = Some(asteroid.id);
    Ok(())
}

/// Bring a ship home from its asteroid.
pub fn recall_ship(corp: &mut Corporation, ship_id: ShipId) -> ActionResult {
    let ship = corp.require_ship_mut(ship_id)?;
    if ship.assigned_asteroid_id.take().is_none() {
        return Err(ActionError::unmet(format!("ship {ship_id} is not assigned")));
    }
    Ok(())
}

/// Build the Advanced Space Dock.
pub fn upgrade_space_dock(corp: &mut Corporation, cost: u64) -> ActionResult {
    if corp.has_advanced_space_dock {
        return Err(ActionError::unmet("Advanced Space Dock already built"));
    }
    corp.spend(cost)?;
    corp.has_advanced_space_dock = true;
    Ok(())
}

/// Pay for a ship now and receive it after the template's build time.
pub fn start_ship_build(
    corp: &mut Corporation,
    class: ShipClass,
    catalog: &Catalog,
    ids: &mut IdAllocator,
) -> ActionResult<ShipBuildOrder> {
    let template = require_template(catalog, class)?;
    check_dock(corp, template)?;
    corp.spend(template.cost)?;

    let turns = template.build_turns.max(1);
    Ok(ShipBuildOrder {
        id: ids.allocate(),
        owner_id: corp.id,
        ship_class: class,
        turns_remaining: turns,
        total_turns: turns,
    })
}

/// Ships finished by one queue advance, plus the orders still pending.
#[derive(Debug, Clone, Default)]
pub struct BuildQueueAdvance {
    /// Newly built ships, in queue order.
    pub completed: Vec<Ship>,
    /// Orders still under construction.
    pub remaining: Vec<ShipBuildOrder>,
}

/// Advance every order by one turn.
///
/// Orders reaching zero leave the queue and each yields one ship built
/// from its class template. Orders whose owner or template no longer
/// exists are dropped.
pub fn advance_build_queue<R: Rng + ?Sized>(
    queue: &[ShipBuildOrder],
    corporations: &BTreeMap<CorporationId, Corporation>,
    catalog: &Catalog,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> BuildQueueAdvance {
    let mut advance = BuildQueueAdvance::default();

    for order in queue {
        let mut order = order.clone();
        order.turns_remaining = order.turns_remaining.saturating_sub(1);
        if order.turns_remaining > 0 {
            advance.remaining.push(order);
            continue;
        }

        let (Some(owner), Some(template)) = (
            corporations.get(&order.owner_id),
            catalog.ship(order.ship_class),
        ) else {
            tracing::warn!(order = %order.id, "Dropping build order with no owner or template");
            continue;
        };
        advance
            .completed
            .push(create_ship(template, ids.allocate(), owner.id, &owner.name, rng));
    }

    advance
}

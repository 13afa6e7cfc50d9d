//! Ship templates.

use serde::{Deserialize, Serialize};

use crate::components::{RangeClass, ShipClass, SlotType, SpeedClass};

/// Equipment slots per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SlotCapacity {
    /// Mining slots.
    pub mining: u32,
    /// Defense slots.
    pub defense: u32,
    /// Weapon slots.
    pub weapon: u32,
}

impl SlotCapacity {
    /// Create a slot layout.
    #[must_use]
    pub const fn new(mining: u32, defense: u32, weapon: u32) -> Self {
        Self {
            mining,
            defense,
            weapon,
        }
    }

    /// Capacity of one slot type.
    #[must_use]
    pub const fn of(&self, slot: SlotType) -> u32 {
        match slot {
            SlotType::Mining => self.mining,
            SlotType::Defense => self.defense,
            SlotType::Weapon => self.weapon,
        }
    }
}

/// Template a ship is built from.
///
/// # Example RON
///
/// ```ron
/// ShipTemplate(
///     class: Prospector,
///     cost: 100,
///     max_health: 50,
///     slots: SlotCapacity(mining: 2, defense: 1, weapon: 0),
///     speed: Medium,
///     range: Short,
///     build_turns: 2,
///     requires_advanced_dock: false,
///     carrier_capacity: None,
///     names: ["Prospector", "Digger"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipTemplate {
    /// Class this template builds.
    pub class: ShipClass,
    /// Purchase price in credits.
    pub cost: u64,
    /// Starting and maximum hull.
    pub max_health: u32,
    /// Slot layout.
    pub slots: SlotCapacity,
    /// Speed class.
    pub speed: SpeedClass,
    /// Range class.
    pub range: RangeClass,
    /// Turns a build order takes.
    pub build_turns: u32,
    /// Whether buying or building needs an Advanced Space Dock.
    pub requires_advanced_dock: bool,
    /// Carrier bay size, if any.
    #[serde(default)]
    pub carrier_capacity: Option<u32>,
    /// Name stems used when naming new ships.
    #[serde(default)]
    pub names: Vec<String>,
}

#[allow(clippy::too_many_arguments)]
fn template(
    class: ShipClass,
    cost: u64,
    max_health: u32,
    slots: SlotCapacity,
    speed: SpeedClass,
    range: RangeClass,
    build_turns: u32,
    requires_advanced_dock: bool,
    carrier_capacity: Option<u32>,
    names: &[&str],
) -> ShipTemplate {
    ShipTemplate {
        class,
        cost,
        max_health,
        slots,
        speed,
        range,
        build_turns,
        requires_advanced_dock,
        carrier_capacity,
        names: names.iter().map(|n| (*n).to_string()).collect(),
    }
}

/// Built-in ship templates, one per class.
#[rustfmt::skip]
#[must_use]
pub fn standard_ships() -> Vec<ShipTemplate> {
    use RangeClass as R;
    use ShipClass as C;
    use SpeedClass as S;

    vec![
        template(C::Prospector, 100, 50, SlotCapacity::new(2, 1, 0), S::Medium, R::Short, 2, false, None, &["Prospector", "Digger", "Miner"]),
        template(C::Harvester, 250, 80, SlotCapacity::new(3, 1, 1), S::Slow, R::Short, 3, true, None, &["Harvester", "Excavator", "Collector"]),
        template(C::Transporter, 400, 120, SlotCapacity::new(4, 2, 0), S::Slow, R::Medium, 4, true, Some(2), &["Hauler", "Freighter", "Mule"]),
        template(C::AssaultFighter, 200, 60, SlotCapacity::new(0, 1, 2), S::Fast, R::Short, 2, false, None, &["Viper", "Hornet", "Dart"]),
        template(C::CombatEagle, 450, 100, SlotCapacity::new(0, 2, 3), S::Fast, R::Medium, 3, true, None, &["Eagle", "Falcon", "Talon"]),
        template(C::Scoutship, 150, 40, SlotCapacity::new(0, 1, 1), S::Fast, R::Long, 1, false, None, &["Scout", "Seeker", "Wisp"]),
        template(C::Destructor, 700, 180, SlotCapacity::new(0, 2, 4), S::Medium, R::Medium, 5, true, None, &["Destructor", "Ravager", "Breaker"]),
        template(C::Terminator, 850, 220, SlotCapacity::new(0, 3, 4), S::Medium, R::Long, 6, true, None, &["Terminator", "Reaper", "Warden"]),
        template(C::FleetBattleship, 1200, 300, SlotCapacity::new(0, 4, 5), S::Slow, R::Long, 8, true, Some(4), &["Behemoth", "Leviathan", "Titan"]),
        template(C::CommandCruiser, 1000, 260, SlotCapacity::new(1, 3, 3), S::Medium, R::Long, 7, true, Some(6), &["Sovereign", "Regent", "Marshal"]),
    ]
}

//! Equipment catalog entries.

use serde::{Deserialize, Serialize};

use crate::components::{AsteroidType, ShipClass, SlotType};

/// A piece of equipment.
///
/// The catalog holds one entry per id; a ship carries copies of these
/// entries in its slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equipment {
    /// Catalog id, e.g. `"basic-mining-laser"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Slot the equipment occupies.
    pub slot: SlotType,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Price in credits.
    pub cost: u64,
    /// Ship classes allowed to mount it.
    pub required_classes: Vec<ShipClass>,
    /// Mining, shield or weapon power depending on `slot`.
    pub power: u32,
    /// Asteroid type a mining item is restricted to.
    #[serde(default)]
    pub asteroid_type_requirement: Option<AsteroidType>,
}

impl Equipment {
    /// Mining power, zero for non-mining items.
    #[must_use]
    pub fn mining_power(&self) -> u32 {
        if self.slot == SlotType::Mining {
            self.power
        } else {
            0
        }
    }

    /// Mining power against a given asteroid type.
    #[must_use]
    pub fn mining_power_against(&self, asteroid_type: AsteroidType) -> u32 {
        match self.asteroid_type_requirement {
            Some(required) if required != asteroid_type => 0,
            _ => self.mining_power(),
        }
    }

    /// Shield power, zero for non-defense items.
    #[must_use]
    pub fn shield_power(&self) -> u32 {
        if self.slot == SlotType::Defense {
            self.power
        } else {
            0
        }
    }

    /// Weapon power, zero for non-weapon items.
    #[must_use]
    pub fn weapon_power(&self) -> u32 {
        if self.slot == SlotType::Weapon {
            self.power
        } else {
            0
        }
    }

    /// Whether a ship class may mount this item.
    #[must_use]
    pub fn allows(&self, class: ShipClass) -> bool {
        self.required_classes.contains(&class)
    }
}

fn item(
    id: &str,
    name: &str,
    slot: SlotType,
    cost: u64,
    power: u32,
    classes: &[ShipClass],
    description: &str,
) -> Equipment {
    Equipment {
        id: id.to_string(),
        name: name.to_string(),
        slot,
        description: description.to_string(),
        cost,
        required_classes: classes.to_vec(),
        power,
        asteroid_type_requirement: None,
    }
}

/// Built-in equipment.
#[rustfmt::skip]
#[must_use]
pub fn standard_equipment() -> Vec<Equipment> {
    use ShipClass::{
        AssaultFighter, CombatEagle, CommandCruiser, Destructor, FleetBattleship, Harvester,
        Prospector, Scoutship, Terminator, Transporter,
    };
    use SlotType::{Defense, Mining, Weapon};

    let capital = [Destructor, Terminator, FleetBattleship, CommandCruiser];

    let mut quantum_drill = item(
        "quantum-drill",
        "Quantum Drill",
        Mining,
        300,
        50,
        &[Transporter],
        "Cuts through metallic cores",
    );
    quantum_drill.asteroid_type_requirement = Some(AsteroidType::M);

    vec![
        item("basic-mining-laser", "Basic Mining Laser", Mining, 50, 10, &[Prospector, Harvester, Transporter], "Standard issue mining laser"),
        item("advanced-mining-laser", "Advanced Mining Laser", Mining, 150, 25, &[Harvester, Transporter], "High-output mining laser"),
        quantum_drill,
        item("basic-shield", "Basic Shield", Defense, 100, 20, &[Prospector, Harvester, AssaultFighter, CombatEagle, Scoutship], "Light deflector"),
        item("advanced-shield", "Advanced Shield", Defense, 250, 50, &[Transporter, Destructor, Terminator, FleetBattleship, CommandCruiser], "Layered deflector"),
        item("quantum-shield", "Quantum Shield", Defense, 500, 100, &[Scoutship, Terminator, FleetBattleship, CommandCruiser], "Phase-shifted barrier"),
        item("point-defense", "Point Defense", Weapon, 100, 15, &[Harvester, AssaultFighter, Scoutship], "Close-in turret"),
        item("plasma-cannon", "Plasma Cannon", Weapon, 200, 30, &[CombatEagle, Destructor, Terminator], "Superheated plasma bolts"),
        item("ion-beam", "Ion Beam", Weapon, 300, 45, &capital, "Disrupts ship systems"),
        item("fusion-lance", "Fusion Lance", Weapon, 500, 75, &capital, "Capital-grade beam weapon"),
        item("missile-battery", "Missile Battery", Weapon, 250, 35, &[CombatEagle, Destructor, Terminator, FleetBattleship, CommandCruiser], "Guided warheads"),
    ]
}

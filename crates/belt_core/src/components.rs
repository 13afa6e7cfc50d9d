//! Shared value types: identifiers, resources, ship classes and statuses.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, ActionResult};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new identifier.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a corporation.
    CorporationId
);
define_id!(
    /// Unique identifier for a ship.
    ShipId
);
define_id!(
    /// Unique identifier for an asteroid.
    AsteroidId
);
define_id!(
    /// Unique identifier for a trader.
    TraderId
);
define_id!(
    /// Unique identifier for a ship build order.
    BuildOrderId
);
define_id!(
    /// Unique identifier for a diplomatic agreement.
    AgreementId
);
define_id!(
    /// Unique identifier for a diplomatic proposal.
    ProposalId
);
define_id!(
    /// Unique identifier for a combat.
    CombatId
);
define_id!(
    /// Unique identifier for one physical card (deck, hand, shop or pile).
    CardInstanceId
);
define_id!(
    /// Unique identifier for a game log entry.
    LogId
);

/// Monotonic id source shared by every entity kind.
///
/// Ids are never reused, so a stale reference in an action can only ever
/// miss, never hit a different entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator starting at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next id as any id type.
    pub fn allocate<T: From<u64>>(&mut self) -> T {
        let id = self.next;
        self.next += 1;
        T::from(id)
    }

    /// Peek at the next raw value without allocating.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Mineable resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Silicates (C-type).
    Silicates,
    /// Oxides (C-type).
    Oxides,
    /// Sulfides (C-type).
    Sulfides,
    /// Iron (M- and S-type).
    Iron,
    /// Nickel (M-type).
    Nickel,
    /// Silicon (S-type).
    Silicon,
    /// Magnesium (S-type).
    Magnesium,
}

impl Resource {
    /// Every resource, in ledger order.
    pub const ALL: [Self; 7] = [
        Self::Silicates,
        Self::Oxides,
        Self::Sulfides,
        Self::Iron,
        Self::Nickel,
        Self::Silicon,
        Self::Magnesium,
    ];

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Silicates => "silicates",
            Self::Oxides => "oxides",
            Self::Sulfides => "sulfides",
            Self::Iron => "iron",
            Self::Nickel => "nickel",
            Self::Silicon => "silicon",
            Self::Magnesium => "magnesium",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Asteroid spectral class; determines composition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AsteroidType {
    /// Carbonaceous.
    C,
    /// Silicaceous.
    S,
    /// Metallic.
    M,
}

impl AsteroidType {
    /// Resources found in this asteroid type.
    #[must_use]
    pub const fn composition(self) -> &'static [Resource] {
        match self {
            Self::C => &[Resource::Silicates, Resource::Oxides, Resource::Sulfides],
            Self::M => &[Resource::Iron, Resource::Nickel],
            Self::S => &[Resource::Iron, Resource::Silicon, Resource::Magnesium],
        }
    }
}

impl fmt::Display for AsteroidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::C => "C",
            Self::S => "S",
            Self::M => "M",
        };
        f.write_str(letter)
    }
}

/// Per-resource quantities. Quantities are unsigned, so they can never go
/// negative; removals that would underflow are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLedger(BTreeMap<Resource, u64>);

impl ResourceLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity held (zero if absent).
    #[must_use]
    pub fn get(&self, resource: Resource) -> u64 {
        self.0.get(&resource).copied().unwrap_or(0)
    }

    /// Add a quantity.
    pub fn add(&mut self, resource: Resource, amount: u64) {
        if amount == 0 {
            return;
        }
        let entry = self.0.entry(resource).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Remove a quantity, rejecting the removal if not enough is held.
    pub fn remove(&mut self, resource: Resource, amount: u64) -> ActionResult {
        let available = self.get(resource);
        if available < amount {
            return Err(ActionError::InsufficientResources {
                resource,
                required: amount,
                available,
            });
        }
        if available == amount {
            self.0.remove(&resource);
        } else {
            self.0.insert(resource, available - amount);
        }
        Ok(())
    }

    /// Add every entry of another ledger.
    pub fn merge(&mut self, other: &Self) {
        for (&resource, &amount) in &other.0 {
            self.add(resource, amount);
        }
    }

    /// A new ledger with every quantity scaled by `percent / 100`, rounded down.
    #[must_use]
    pub fn scaled(&self, percent: u32) -> Self {
        let mut out = Self::new();
        for (&resource, &amount) in &self.0 {
            out.add(resource, amount.saturating_mul(u64::from(percent)) / 100);
        }
        out
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// `true` if every quantity is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|&v| v == 0)
    }

    /// Iterate over non-zero entries in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u64)> + '_ {
        self.0
            .iter()
            .filter(|(_, v)| **v > 0)
            .map(|(&r, &v)| (r, v))
    }
}

impl FromIterator<(Resource, u64)> for ResourceLedger {
    fn from_iter<I: IntoIterator<Item = (Resource, u64)>>(iter: I) -> Self {
        let mut ledger = Self::new();
        for (resource, amount) in iter {
            ledger.add(resource, amount);
        }
        ledger
    }
}

/// AI personality. Each trait is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Likelihood to engage in combat.
    pub aggression: f64,
    /// Likelihood to accept diplomatic proposals.
    pub cooperation: f64,
    /// Focus on resource acquisition.
    pub greed: f64,
}

impl Personality {
    /// Create a personality, clamping every trait into `[0, 1]`.
    #[must_use]
    pub fn new(aggression: f64, cooperation: f64, greed: f64) -> Self {
        Self {
            aggression: aggression.clamp(0.0, 1.0),
            cooperation: cooperation.clamp(0.0, 1.0),
            greed: greed.clamp(0.0, 1.0),
        }
    }
}

/// Relationship between two corporations, from friendliest to worst.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DiplomaticStatus {
    /// Allied.
    Friendly,
    /// Default relationship.
    #[default]
    Neutral,
    /// Tense.
    Hostile,
    /// Open conflict. Only a peace agreement leaves this state.
    War,
}

impl DiplomaticStatus {
    /// One step worse (friendly → neutral → hostile → war). War stays war.
    #[must_use]
    pub const fn degraded(self) -> Self {
        match self {
            Self::Friendly => Self::Neutral,
            Self::Neutral => Self::Hostile,
            Self::Hostile | Self::War => Self::War,
        }
    }
}

/// The ten ship classes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ShipClass {
    /// Entry-level miner.
    Prospector,
    /// Mid-size miner.
    Harvester,
    /// Heavy miner with carrier bay.
    Transporter,
    /// Light fighter.
    AssaultFighter,
    /// Medium fighter.
    CombatEagle,
    /// Fast scout.
    Scoutship,
    /// Heavy warship.
    Destructor,
    /// Heavy warship with long range.
    Terminator,
    /// Capital ship.
    FleetBattleship,
    /// Capital command ship.
    CommandCruiser,
}

impl ShipClass {
    /// Every class.
    pub const ALL: [Self; 10] = [
        Self::Prospector,
        Self::Harvester,
        Self::Transporter,
        Self::AssaultFighter,
        Self::CombatEagle,
        Self::Scoutship,
        Self::Destructor,
        Self::Terminator,
        Self::FleetBattleship,
        Self::CommandCruiser,
    ];

    /// Kebab-case name as used in catalogs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Prospector => "prospector",
            Self::Harvester => "harvester",
            Self::Transporter => "transporter",
            Self::AssaultFighter => "assault-fighter",
            Self::CombatEagle => "combat-eagle",
            Self::Scoutship => "scoutship",
            Self::Destructor => "destructor",
            Self::Terminator => "terminator",
            Self::FleetBattleship => "fleet-battleship",
            Self::CommandCruiser => "command-cruiser",
        }
    }
}

impl fmt::Display for ShipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equipment slot type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    /// Mining lasers and drills.
    Mining,
    /// Shields.
    Defense,
    /// Weapons.
    Weapon,
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mining => "mining",
            Self::Defense => "defense",
            Self::Weapon => "weapon",
        };
        f.write_str(name)
    }
}

/// Ship speed class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    /// Slow.
    Slow,
    /// Medium.
    Medium,
    /// Fast.
    Fast,
}

/// Ship range class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeClass {
    /// Short.
    Short,
    /// Medium.
    Medium,
    /// Long.
    Long,
}

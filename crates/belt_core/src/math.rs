//! Fixed-point math utilities.
//!
//! Ship health and combat damage use fixed-point arithmetic so that
//! splitting damage across targets gives bit-identical results on every
//! platform. Floating point is only used for probabilities and price
//! fluctuation, which are always rounded back to integers.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for combat math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector, used for asteroid map positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Build a vector from integer map coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// `true` when `value / max < num / den`, computed without division.
#[must_use]
pub fn fraction_below(value: Fixed, max: Fixed, num: i32, den: i32) -> bool {
    value.saturating_mul(Fixed::from_num(den)) < max.saturating_mul(Fixed::from_num(num))
}

/// `true` when `value / max > num / den`, computed without division.
#[must_use]
pub fn fraction_above(value: Fixed, max: Fixed, num: i32, den: i32) -> bool {
    value.saturating_mul(Fixed::from_num(den)) > max.saturating_mul(Fixed::from_num(num))
}

use serde::{Deserialize, Serialize};

use super::{TaggedValue, Unit, UnitMismatchError, ValueError};

/// A closed interval `[lower, upper]` tagged with a [`Unit`].
///
/// Serialized as `[[lower, upper], "unit"]`.
/// Degenerate intervals such as `[0, 0]` are allowed and pin a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "([f64; 2], Unit)", into = "([f64; 2], Unit)")]
pub struct TaggedBounds {
    lower: f64,
    upper: f64,
    unit: Unit,
}

impl TaggedBounds {
    #[must_use]
    pub fn new(lower: f64, upper: f64, unit: Unit) -> Self {
        Self { lower, upper, unit }
    }

    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Returns these bounds expressed in `unit`.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitMismatchError`] if `unit` has a different dimension.
    pub fn convert_to(&self, unit: Unit) -> Result<Self, UnitMismatchError> {
        Ok(Self {
            lower: self.unit.convert(self.lower, unit)?,
            upper: self.unit.convert(self.upper, unit)?,
            unit,
        })
    }

    /// Returns `true` if the scalar `value` lies inside the interval.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if `value` is an array or has another dimension.
    pub fn contains(&self, value: &TaggedValue) -> Result<bool, ValueError> {
        let value = value.scalar_in(self.unit)?;
        Ok(self.lower <= value && value <= self.upper)
    }

    /// Returns the interval sum `[a.lower + b.lower, a.upper + b.upper]` in `self`'s unit.
    ///
    /// Used to carry a phase's initial time bounds through its duration bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitMismatchError`] if `other` has a different dimension.
    pub fn checked_add(&self, other: &Self) -> Result<Self, UnitMismatchError> {
        let other = other.convert_to(self.unit)?;
        Ok(Self {
            lower: self.lower + other.lower,
            upper: self.upper + other.upper,
            unit: self.unit,
        })
    }
}

impl From<([f64; 2], Unit)> for TaggedBounds {
    fn from(([lower, upper], unit): ([f64; 2], Unit)) -> Self {
        Self { lower, upper, unit }
    }
}

impl From<TaggedBounds> for ([f64; 2], Unit) {
    fn from(bounds: TaggedBounds) -> Self {
        ([bounds.lower, bounds.upper], bounds.unit)
    }
}

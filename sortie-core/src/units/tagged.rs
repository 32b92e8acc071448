use ndarray::Array1;
use serde::{Deserialize, Serialize};
use uom::si::{
    f64::{Length, Mass, Ratio, Time},
    length::meter,
    mass::kilogram,
    ratio::ratio,
    time::second,
};

use super::{Dimension, Unit, UnitMismatchError, ValueError};

/// The numeric part of a [`TaggedValue`]: a scalar or a 1-D array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Magnitude {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Magnitude {
    /// Returns the number of elements (one for a scalar).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Array(values) => values.len(),
        }
    }

    /// Returns `true` for an empty array.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_map<E>(&self, mut f: impl FnMut(f64) -> Result<f64, E>) -> Result<Self, E> {
        Ok(match self {
            Self::Scalar(value) => Self::Scalar(f(*value)?),
            Self::Array(values) => {
                Self::Array(values.iter().map(|&v| f(v)).collect::<Result<_, _>>()?)
            }
        })
    }
}

/// A number or array paired with the [`Unit`] it is expressed in.
///
/// At serialization boundaries a tagged value is the pair `[value, "unit"]`,
/// where `value` is either a number or an array of numbers.
///
/// There is no arithmetic on tagged values.
/// Numbers are taken out in an explicitly requested unit, which is the only
/// place a conversion can happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Magnitude, Unit)", into = "(Magnitude, Unit)")]
pub struct TaggedValue {
    magnitude: Magnitude,
    unit: Unit,
}

impl TaggedValue {
    /// Creates a scalar tagged value.
    #[must_use]
    pub fn scalar(value: f64, unit: Unit) -> Self {
        Self {
            magnitude: Magnitude::Scalar(value),
            unit,
        }
    }

    /// Creates an array tagged value.
    #[must_use]
    pub fn array(values: impl Into<Vec<f64>>, unit: Unit) -> Self {
        Self {
            magnitude: Magnitude::Array(values.into()),
            unit,
        }
    }

    #[must_use]
    pub fn magnitude(&self) -> &Magnitude {
        &self.magnitude
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Returns the scalar in its stored unit, or `None` for an array.
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self.magnitude {
            Magnitude::Scalar(value) => Some(value),
            Magnitude::Array(_) => None,
        }
    }

    /// Returns a copy of this value expressed in `unit`.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitMismatchError`] if `unit` has a different dimension.
    pub fn convert_to(&self, unit: Unit) -> Result<Self, UnitMismatchError> {
        let magnitude = self
            .magnitude
            .try_map(|value| self.unit.convert(value, unit))?;
        Ok(Self { magnitude, unit })
    }

    /// Returns the scalar expressed in `unit`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if the value is an array or the units are incompatible.
    pub fn scalar_in(&self, unit: Unit) -> Result<f64, ValueError> {
        match self.magnitude {
            Magnitude::Scalar(value) => Ok(self.unit.convert(value, unit)?),
            Magnitude::Array(ref values) => Err(ValueError::NotScalar { len: values.len() }),
        }
    }

    /// Returns the elements expressed in `unit`; a scalar becomes a one-element array.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitMismatchError`] if the units are incompatible.
    pub fn array_in(&self, unit: Unit) -> Result<Array1<f64>, UnitMismatchError> {
        let converted = self.convert_to(unit)?;
        Ok(match converted.magnitude {
            Magnitude::Scalar(value) => Array1::from_elem(1, value),
            Magnitude::Array(values) => Array1::from_vec(values),
        })
    }
}

macro_rules! quantity_accessors {
    ($($get:ident, $from:ident => $quantity:ident, $base:ident, $dimension:ident;)+) => {
        impl TaggedValue {
            $(
                #[doc = concat!("Returns the scalar as a `uom` [`", stringify!($quantity), "`].")]
                ///
                /// # Errors
                ///
                /// Returns a [`ValueError`] if the value is an array or has another dimension.
                pub fn $get(&self) -> Result<$quantity, ValueError> {
                    let base = self.scalar_in(Dimension::$dimension.base_unit())?;
                    Ok($quantity::new::<$base>(base))
                }

                #[doc = concat!("Creates a scalar from a `uom` [`", stringify!($quantity), "`] expressed in `unit`.")]
                ///
                /// # Errors
                ///
                /// Returns a [`UnitMismatchError`] if `unit` has another dimension.
                pub fn $from(quantity: $quantity, unit: Unit) -> Result<Self, UnitMismatchError> {
                    let value = Dimension::$dimension
                        .base_unit()
                        .convert(quantity.get::<$base>(), unit)?;
                    Ok(Self::scalar(value, unit))
                }
            )+
        }
    };
}

quantity_accessors!(
    length, from_length => Length, meter, Length;
    mass, from_mass => Mass, kilogram, Mass;
    time, from_time => Time, second, Time;
    ratio, from_ratio => Ratio, ratio, Dimensionless;
);

impl From<(Magnitude, Unit)> for TaggedValue {
    fn from((magnitude, unit): (Magnitude, Unit)) -> Self {
        Self { magnitude, unit }
    }
}

impl From<TaggedValue> for (Magnitude, Unit) {
    fn from(value: TaggedValue) -> Self {
        (value.magnitude, value.unit)
    }
}

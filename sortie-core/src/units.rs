//! Physical units and unit-tagged values.
//!
//! Every number that crosses an interface boundary in Sortie carries a [`Unit`].
//! Conversions go through [`Unit::convert`], which delegates the actual scale
//! factors to `uom` quantities and refuses to mix dimensions.
//!
//! Converting a value to the unit it already has is the identity, so reading a
//! value back in its stored unit never introduces floating-point drift.

mod bounds;
mod tagged;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::{
    f64::{Length, Mass, Ratio, Time},
    length::{foot, kilometer, meter, nautical_mile},
    mass::{kilogram, pound},
    ratio::ratio,
    time::{hour, minute, second},
};

pub use bounds::TaggedBounds;
pub use tagged::{Magnitude, TaggedValue};

/// The physical dimension of a [`Unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Dimensionless,
    Length,
    Mass,
    Time,
    MassRate,
}

impl Dimension {
    /// Returns the SI unit used as the conversion pivot for this dimension.
    #[must_use]
    pub const fn base_unit(self) -> Unit {
        match self {
            Self::Dimensionless => Unit::Unitless,
            Self::Length => Unit::Meter,
            Self::Mass => Unit::Kilogram,
            Self::Time => Unit::Second,
            Self::MassRate => Unit::KilogramPerSecond,
        }
    }
}

/// A physical unit understood by the conversion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    Unitless,
    Foot,
    Meter,
    Kilometer,
    NauticalMile,
    PoundMass,
    Kilogram,
    Second,
    Minute,
    Hour,
    PoundMassPerSecond,
    PoundMassPerHour,
    KilogramPerSecond,
}

impl Unit {
    /// Returns the canonical symbol used at serialization boundaries.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Unitless => "unitless",
            Self::Foot => "ft",
            Self::Meter => "m",
            Self::Kilometer => "km",
            Self::NauticalMile => "nmi",
            Self::PoundMass => "lbm",
            Self::Kilogram => "kg",
            Self::Second => "s",
            Self::Minute => "min",
            Self::Hour => "h",
            Self::PoundMassPerSecond => "lbm/s",
            Self::PoundMassPerHour => "lbm/h",
            Self::KilogramPerSecond => "kg/s",
        }
    }

    /// Returns the physical dimension of this unit.
    #[must_use]
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Unitless => Dimension::Dimensionless,
            Self::Foot | Self::Meter | Self::Kilometer | Self::NauticalMile => Dimension::Length,
            Self::PoundMass | Self::Kilogram => Dimension::Mass,
            Self::Second | Self::Minute | Self::Hour => Dimension::Time,
            Self::PoundMassPerSecond | Self::PoundMassPerHour | Self::KilogramPerSecond => {
                Dimension::MassRate
            }
        }
    }

    /// Converts `value` expressed in `self` into the unit `to`.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitMismatchError`] if the two units have different dimensions.
    pub fn convert(self, value: f64, to: Unit) -> Result<f64, UnitMismatchError> {
        if self == to {
            return Ok(value);
        }
        if self.dimension() != to.dimension() {
            return Err(UnitMismatchError { from: self, to });
        }
        Ok(to.from_base(self.to_base(value)))
    }

    /// Expresses `value` in the SI base unit of this unit's dimension.
    fn to_base(self, value: f64) -> f64 {
        match self {
            Self::Unitless => Ratio::new::<ratio>(value).value,
            Self::Foot => Length::new::<foot>(value).value,
            Self::Meter => Length::new::<meter>(value).value,
            Self::Kilometer => Length::new::<kilometer>(value).value,
            Self::NauticalMile => Length::new::<nautical_mile>(value).value,
            Self::PoundMass => Mass::new::<pound>(value).value,
            Self::Kilogram => Mass::new::<kilogram>(value).value,
            Self::Second => Time::new::<second>(value).value,
            Self::Minute => Time::new::<minute>(value).value,
            Self::Hour => Time::new::<hour>(value).value,
            Self::PoundMassPerSecond => (Mass::new::<pound>(value) / Time::new::<second>(1.0)).value,
            Self::PoundMassPerHour => (Mass::new::<pound>(value) / Time::new::<hour>(1.0)).value,
            Self::KilogramPerSecond => {
                (Mass::new::<kilogram>(value) / Time::new::<second>(1.0)).value
            }
        }
    }

    /// Expresses an SI base `value` in this unit.
    fn from_base(self, value: f64) -> f64 {
        match self {
            Self::Unitless => Ratio::new::<ratio>(value).get::<ratio>(),
            Self::Foot => Length::new::<meter>(value).get::<foot>(),
            Self::Meter => Length::new::<meter>(value).get::<meter>(),
            Self::Kilometer => Length::new::<meter>(value).get::<kilometer>(),
            Self::NauticalMile => Length::new::<meter>(value).get::<nautical_mile>(),
            Self::PoundMass => Mass::new::<kilogram>(value).get::<pound>(),
            Self::Kilogram => Mass::new::<kilogram>(value).get::<kilogram>(),
            Self::Second => Time::new::<second>(value).get::<second>(),
            Self::Minute => Time::new::<second>(value).get::<minute>(),
            Self::Hour => Time::new::<second>(value).get::<hour>(),
            Self::PoundMassPerSecond => {
                Mass::new::<kilogram>(value).get::<pound>() * Time::new::<second>(1.0).value
            }
            Self::PoundMassPerHour => {
                Mass::new::<kilogram>(value).get::<pound>() * Time::new::<hour>(1.0).value
            }
            Self::KilogramPerSecond => Mass::new::<kilogram>(value).get::<kilogram>(),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = UnknownUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unitless" => Ok(Self::Unitless),
            "ft" => Ok(Self::Foot),
            "m" => Ok(Self::Meter),
            "km" => Ok(Self::Kilometer),
            "nmi" | "NM" => Ok(Self::NauticalMile),
            "lbm" => Ok(Self::PoundMass),
            "kg" => Ok(Self::Kilogram),
            "s" => Ok(Self::Second),
            "min" => Ok(Self::Minute),
            "h" | "hr" => Ok(Self::Hour),
            "lbm/s" => Ok(Self::PoundMassPerSecond),
            "lbm/h" => Ok(Self::PoundMassPerHour),
            "kg/s" => Ok(Self::KilogramPerSecond),
            other => Err(UnknownUnitError(other.to_owned())),
        }
    }
}

impl TryFrom<String> for Unit {
    type Error = UnknownUnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.symbol().to_owned()
    }
}

/// A value was read or combined in a unit of a different dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot convert `{from}` to `{to}`: {:?} is not {:?}", .from.dimension(), .to.dimension())]
pub struct UnitMismatchError {
    pub from: Unit,
    pub to: Unit,
}

/// A unit symbol is not in the conversion table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown unit `{0}`")]
pub struct UnknownUnitError(pub String);

/// Errors that can occur when extracting a number from a [`TaggedValue`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error(transparent)]
    Unit(#[from] UnitMismatchError),

    #[error("expected a scalar, found an array of length {len}")]
    NotScalar { len: usize },
}

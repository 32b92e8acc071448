use sortie_core::{ConfigurationStore, Dimension, StoreError, TaggedValue, Unit, Variable};
use thiserror::Error;
use uom::si::{
    f64::{Length, Mass, Ratio},
    length::meter,
    mass::kilogram,
    ratio::ratio,
};

/// Errors that can occur when building [`DesignScalars`].
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum DesignError {
    #[error("`{variable}` must be a {expected:?} value, got unit `{unit}`")]
    Dimension {
        variable: Variable,
        expected: Dimension,
        unit: Unit,
    },

    #[error("`{variable}` must be a scalar, found {len} values")]
    NotScalar { variable: Variable, len: usize },

    #[error("`{variable}` must be finite, got {value}")]
    NonFinite { variable: Variable, value: f64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The top-level scalars a mission is parameterized by.
///
/// Each scalar keeps the unit it was given in; consumers convert on read.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignScalars {
    cruise_altitude: TaggedValue,
    cruise_mach: TaggedValue,
    range: TaggedValue,
    gross_mass: Option<TaggedValue>,
}

impl DesignScalars {
    /// Creates design scalars from a cruise altitude, cruise Mach, and design range.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is not a finite scalar of the right dimension.
    pub fn new(
        cruise_altitude: TaggedValue,
        cruise_mach: TaggedValue,
        range: TaggedValue,
    ) -> Result<Self, DesignError> {
        Ok(Self {
            cruise_altitude: checked(Variable::CruiseAltitude, cruise_altitude, Dimension::Length)?,
            cruise_mach: checked(Variable::CruiseMach, cruise_mach, Dimension::Dimensionless)?,
            range: checked(Variable::DesignRange, range, Dimension::Length)?,
            gross_mass: None,
        })
    }

    /// Returns `self` with a design gross mass.
    ///
    /// # Errors
    ///
    /// Returns an error if `gross_mass` is not a finite scalar mass.
    pub fn with_gross_mass(mut self, gross_mass: TaggedValue) -> Result<Self, DesignError> {
        self.gross_mass = Some(checked(Variable::DesignGrossMass, gross_mass, Dimension::Mass)?);
        Ok(self)
    }

    /// Reads the design scalars from a configuration store.
    ///
    /// The design gross mass is optional; the other three are required.
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is missing or any value is invalid.
    pub fn from_store(store: &ConfigurationStore) -> Result<Self, DesignError> {
        let scalars = Self::new(
            store.value(Variable::CruiseAltitude)?.clone(),
            store.value(Variable::CruiseMach)?.clone(),
            store.value(Variable::DesignRange)?.clone(),
        )?;
        match store.value(Variable::DesignGrossMass) {
            Ok(gross_mass) => scalars.with_gross_mass(gross_mass.clone()),
            Err(StoreError::Missing { .. }) => Ok(scalars),
            Err(err) => Err(err.into()),
        }
    }

    #[must_use]
    pub fn cruise_altitude(&self) -> &TaggedValue {
        &self.cruise_altitude
    }

    #[must_use]
    pub fn cruise_mach(&self) -> &TaggedValue {
        &self.cruise_mach
    }

    #[must_use]
    pub fn range(&self) -> &TaggedValue {
        &self.range
    }

    #[must_use]
    pub fn gross_mass(&self) -> Option<&TaggedValue> {
        self.gross_mass.as_ref()
    }

    /// Returns the cruise altitude as a `uom` [`Length`].
    #[must_use]
    pub fn cruise_altitude_length(&self) -> Length {
        Length::new::<meter>(base_scalar(&self.cruise_altitude))
    }

    /// Returns the cruise Mach number as a `uom` [`Ratio`].
    #[must_use]
    pub fn cruise_mach_ratio(&self) -> Ratio {
        Ratio::new::<ratio>(base_scalar(&self.cruise_mach))
    }

    /// Returns the design range as a `uom` [`Length`].
    #[must_use]
    pub fn range_length(&self) -> Length {
        Length::new::<meter>(base_scalar(&self.range))
    }

    /// Returns the design gross mass as a `uom` [`Mass`].
    #[must_use]
    pub fn gross_mass_quantity(&self) -> Option<Mass> {
        self.gross_mass
            .as_ref()
            .map(|m| Mass::new::<kilogram>(base_scalar(m)))
    }
}

/// Returns a checked scalar in the SI base unit of its dimension.
fn base_scalar(value: &TaggedValue) -> f64 {
    value
        .scalar_in(value.unit().dimension().base_unit())
        .unwrap_or(f64::NAN)
}

fn checked(
    variable: Variable,
    value: TaggedValue,
    expected: Dimension,
) -> Result<TaggedValue, DesignError> {
    if value.unit().dimension() != expected {
        return Err(DesignError::Dimension {
            variable,
            expected,
            unit: value.unit(),
        });
    }
    let Some(scalar) = value.as_scalar() else {
        return Err(DesignError::NotScalar {
            variable,
            len: value.magnitude().len(),
        });
    };
    if !scalar.is_finite() {
        return Err(DesignError::NonFinite {
            variable,
            value: scalar,
        });
    }
    Ok(value)
}

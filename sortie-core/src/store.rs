//! The configuration store of fixed options and design scalars.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::f64::{Length, Mass, Ratio, Time};

use crate::{
    units::{TaggedValue, Unit, UnitMismatchError, ValueError},
    variable::{Variable, VariableRegistry},
};

/// Unit-tagged values keyed by [`Variable`].
///
/// Values keep the unit they were stored in.
/// Every read names the unit it wants, and conversion happens at that point.
///
/// Serialized as a JSON object mapping namespaced variable names to
/// `[value, "unit"]` pairs:
///
/// ```
/// use sortie_core::{ConfigurationStore, Unit, Variable};
///
/// let store: ConfigurationStore = serde_json::from_str(
///     r#"{ "mission:taxi:duration": [10.0, "min"] }"#,
/// ).unwrap();
///
/// let seconds = store.scalar(Variable::TaxiDuration, Unit::Second).unwrap();
/// assert!((seconds - 600.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationStore {
    values: BTreeMap<Variable, TaggedValue>,
}

impl ConfigurationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `self` with `variable` set to `value`.
    #[must_use]
    pub fn with(mut self, variable: Variable, value: TaggedValue) -> Self {
        self.set(variable, value);
        self
    }

    /// Stores `value`, returning the value it replaced.
    pub fn set(&mut self, variable: Variable, value: TaggedValue) -> Option<TaggedValue> {
        self.values.insert(variable, value)
    }

    #[must_use]
    pub fn contains(&self, variable: Variable) -> bool {
        self.values.contains_key(&variable)
    }

    /// Returns the value exactly as stored, in its stored unit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] if nothing is stored for `variable`.
    pub fn value(&self, variable: Variable) -> Result<&TaggedValue, StoreError> {
        self.values
            .get(&variable)
            .ok_or(StoreError::Missing { variable })
    }

    /// Returns the value for `variable` expressed in `unit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing or cannot be expressed in `unit`.
    pub fn get(&self, variable: Variable, unit: Unit) -> Result<TaggedValue, StoreError> {
        self.value(variable)?
            .convert_to(unit)
            .map_err(|source| StoreError::Unit { variable, source })
    }

    /// Returns the scalar for `variable` expressed in `unit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a scalar, or cannot be
    /// expressed in `unit`.
    pub fn scalar(&self, variable: Variable, unit: Unit) -> Result<f64, StoreError> {
        scalar_of(variable, self.value(variable)?, unit)
    }

    /// Returns the stored scalar, or the registry default when none is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is neither stored nor registered, or if
    /// the value cannot be expressed in `unit`.
    pub fn scalar_or_default(
        &self,
        variable: Variable,
        unit: Unit,
        registry: &VariableRegistry,
    ) -> Result<f64, StoreError> {
        if let Some(value) = self.values.get(&variable) {
            return scalar_of(variable, value, unit);
        }
        let meta = registry
            .get(variable)
            .ok_or(StoreError::Missing { variable })?;
        log::debug!("`{variable}` not configured, using default {} {}", meta.default, meta.unit);
        scalar_of(variable, &TaggedValue::scalar(meta.default, meta.unit), unit)
    }

    /// Returns a non-negative whole-number option such as a passenger count.
    ///
    /// Falls back to the registry default when the option is not stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, dimensional, or not a
    /// non-negative integer.
    pub fn count_or_default(
        &self,
        variable: Variable,
        registry: &VariableRegistry,
    ) -> Result<u32, StoreError> {
        let value = self.scalar_or_default(variable, Unit::Unitless, registry)?;
        if value.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&value) {
            return Err(StoreError::NotACount { variable, value });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = value as u32;
        Ok(count)
    }

    /// Returns a length-valued scalar as a `uom` [`Length`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a scalar, or not a length.
    pub fn length(&self, variable: Variable) -> Result<Length, StoreError> {
        self.value(variable)?
            .length()
            .map_err(|source| StoreError::from_value(variable, source))
    }

    /// Returns a mass-valued scalar as a `uom` [`Mass`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a scalar, or not a mass.
    pub fn mass(&self, variable: Variable) -> Result<Mass, StoreError> {
        self.value(variable)?
            .mass()
            .map_err(|source| StoreError::from_value(variable, source))
    }

    /// Returns a time-valued scalar as a `uom` [`Time`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a scalar, or not a time.
    pub fn time(&self, variable: Variable) -> Result<Time, StoreError> {
        self.value(variable)?
            .time()
            .map_err(|source| StoreError::from_value(variable, source))
    }

    /// Returns a dimensionless scalar as a `uom` [`Ratio`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a scalar, or dimensional.
    pub fn ratio(&self, variable: Variable) -> Result<Ratio, StoreError> {
        self.value(variable)?
            .ratio()
            .map_err(|source| StoreError::from_value(variable, source))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &TaggedValue)> {
        self.values.iter().map(|(&variable, value)| (variable, value))
    }
}

fn scalar_of(variable: Variable, value: &TaggedValue, unit: Unit) -> Result<f64, StoreError> {
    value
        .scalar_in(unit)
        .map_err(|source| StoreError::from_value(variable, source))
}

/// Errors that can occur when reading from a [`ConfigurationStore`].
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("`{variable}` is not configured")]
    Missing { variable: Variable },

    #[error("`{variable}` has an incompatible unit")]
    Unit {
        variable: Variable,
        #[source]
        source: UnitMismatchError,
    },

    #[error("`{variable}` must be a scalar, found {len} values")]
    NotScalar { variable: Variable, len: usize },

    #[error("`{variable}` must be a non-negative whole number, got {value}")]
    NotACount { variable: Variable, value: f64 },
}

impl StoreError {
    fn from_value(variable: Variable, error: ValueError) -> Self {
        match error {
            ValueError::Unit(source) => Self::Unit { variable, source },
            ValueError::NotScalar { len } => Self::NotScalar { variable, len },
        }
    }

    /// Returns the variable the failed read was for.
    #[must_use]
    pub fn variable(&self) -> Variable {
        match self {
            Self::Missing { variable }
            | Self::Unit { variable, .. }
            | Self::NotScalar { variable, .. }
            | Self::NotACount { variable, .. } => *variable,
        }
    }
}

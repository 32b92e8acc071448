//! The enumerated variable namespace.
//!
//! Each [`Variable`] has a flat, namespaced name (`aircraft:...`, `mission:...`,
//! `dynamic:...`) that is only used at serialization boundaries.
//! Inside the crate variables are always referred to by enum value.

mod registry;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use registry::{VariableMeta, VariableRegistry};

macro_rules! define_variables {
    ($($(#[$doc:meta])* $variant:ident => $name:literal),+ $(,)?) => {
        /// A variable known to the Sortie namespace.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        #[non_exhaustive]
        pub enum Variable {
            $($(#[$doc])* $variant),+
        }

        impl Variable {
            /// Every variable, in declaration order.
            pub const ALL: &'static [Variable] = &[$(Variable::$variant),+];

            /// Returns the namespaced name used at serialization boundaries.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Variable::$variant => $name),+
                }
            }
        }

        impl FromStr for Variable {
            type Err = UnknownVariableError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Variable::$variant),)+
                    other => Err(UnknownVariableError(other.to_owned())),
                }
            }
        }
    };
}

define_variables!(
    /// Number of passengers carried.
    NumPassengers => "aircraft:crew_and_payload:num_passengers",
    /// Mass of a single passenger.
    MassPerPassenger => "aircraft:crew_and_payload:mass_per_passenger",
    /// Baggage mass carried per passenger.
    BaggageMassPerPassenger => "aircraft:crew_and_payload:baggage_mass_per_passenger",
    WingCargo => "aircraft:crew_and_payload:wing_cargo",
    MiscCargo => "aircraft:crew_and_payload:misc_cargo",
    PassengerMass => "aircraft:crew_and_payload:passenger_mass",
    BaggageMass => "aircraft:crew_and_payload:baggage_mass",
    /// Passengers plus their baggage.
    PassengerPayloadMass => "aircraft:crew_and_payload:passenger_payload_mass",
    CargoMass => "aircraft:crew_and_payload:cargo_mass",
    TotalPayloadMass => "aircraft:crew_and_payload:total_payload_mass",
    CruiseAltitude => "mission:design:cruise_altitude",
    DesignRange => "mission:design:range",
    DesignGrossMass => "mission:design:gross_mass",
    CruiseMach => "mission:summary:cruise_mach",
    GrossMass => "mission:summary:gross_mass",
    TaxiDuration => "mission:taxi:duration",
    /// Fuel burned while taxiing, per node.
    TaxiFuelConsumed => "taxi_fuel_consumed",
    /// Total fuel flow, negative when fuel is being burned.
    FuelFlowRateNegativeTotal => "dynamic:mission:fuel_flow_rate_negative_total",
    /// Aircraft mass, per node.
    Mass => "dynamic:mission:mass",
);

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Variable {
    type Error = UnknownVariableError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Variable> for String {
    fn from(variable: Variable) -> Self {
        variable.name().to_owned()
    }
}

/// A variable name is not part of the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown variable `{0}`")]
pub struct UnknownVariableError(pub String);

//! Payload mass build-up.

use ndarray::Array1;
use sortie_core::{
    Component, ConfigurationError, ConfigurationStore, Declaration, EvaluationError, StoreError,
    Structure, Unit, Values, Variable, VariableRegistry,
    constraint::{Requirement, require},
};
use uom::si::{f64::Mass, mass::pound};

/// Sums passenger, baggage, and cargo mass into the total payload.
///
/// Passenger count and per-passenger masses are fixed options, so the
/// passenger terms are constants and only the cargo inputs carry derivatives:
///
/// ```text
/// passenger_mass         = mass_per_passenger · num_passengers
/// baggage_mass           = baggage_mass_per_passenger · num_passengers
/// passenger_payload_mass = passenger_mass + baggage_mass
/// cargo_mass             = wing_cargo + misc_cargo
/// total_payload_mass     = passenger_payload_mass + cargo_mass
/// ```
///
/// Every partial is a constant `1.0` declared at configuration time.
#[derive(Debug, Clone, PartialEq)]
pub struct CargoMass {
    declaration: Declaration,
    passengers: u32,
    mass_per_passenger: f64,
    baggage_per_passenger: f64,
}

impl CargoMass {
    pub const NAME: &'static str = "CargoMass";

    #[must_use]
    pub fn passengers(&self) -> u32 {
        self.passengers
    }

    /// Returns the mass of one passenger.
    #[must_use]
    pub fn mass_per_passenger(&self) -> Mass {
        Mass::new::<pound>(self.mass_per_passenger)
    }

    /// Returns the baggage mass carried per passenger.
    #[must_use]
    pub fn baggage_per_passenger(&self) -> Mass {
        Mass::new::<pound>(self.baggage_per_passenger)
    }

    fn cargo(&self, inputs: &Values, variable: Variable) -> Result<f64, EvaluationError> {
        let values = self.declaration.input_values(inputs, variable)?;
        require(Self::NAME, variable, values, Requirement::NonNegative)?;
        Ok(values[0])
    }
}

fn option_error(source: StoreError) -> ConfigurationError {
    ConfigurationError::Option {
        component: CargoMass::NAME,
        source,
    }
}

fn non_negative_option(variable: Variable, value: f64) -> Result<f64, ConfigurationError> {
    if Requirement::NonNegative.is_met(value) {
        Ok(value)
    } else {
        Err(ConfigurationError::InvalidOption {
            component: CargoMass::NAME,
            variable,
            value,
            requirement: Requirement::NonNegative,
        })
    }
}

impl Component for CargoMass {
    fn configure(
        node_count: usize,
        registry: &VariableRegistry,
        options: &ConfigurationStore,
    ) -> Result<Self, ConfigurationError> {
        let passengers = options
            .count_or_default(Variable::NumPassengers, registry)
            .map_err(option_error)?;
        let mass_per_passenger = options
            .scalar_or_default(Variable::MassPerPassenger, Unit::PoundMass, registry)
            .map_err(option_error)
            .and_then(|value| non_negative_option(Variable::MassPerPassenger, value))?;
        let baggage_per_passenger = options
            .scalar_or_default(Variable::BaggageMassPerPassenger, Unit::PoundMass, registry)
            .map_err(option_error)
            .and_then(|value| non_negative_option(Variable::BaggageMassPerPassenger, value))?;

        let declaration = Declaration::builder(Self::NAME, node_count)
            .input(Variable::WingCargo)
            .input(Variable::MiscCargo)
            .output(Variable::PassengerMass)
            .output(Variable::BaggageMass)
            .output(Variable::PassengerPayloadMass)
            .output(Variable::CargoMass)
            .output(Variable::TotalPayloadMass)
            .constant_partial(Variable::CargoMass, Variable::WingCargo, Structure::DenseBlock, 1.0)
            .constant_partial(Variable::CargoMass, Variable::MiscCargo, Structure::DenseBlock, 1.0)
            .constant_partial(
                Variable::TotalPayloadMass,
                Variable::WingCargo,
                Structure::DenseBlock,
                1.0,
            )
            .constant_partial(
                Variable::TotalPayloadMass,
                Variable::MiscCargo,
                Structure::DenseBlock,
                1.0,
            )
            .build(registry)?;

        log::debug!(
            "configured {} for {passengers} passengers at {mass_per_passenger} lbm + {baggage_per_passenger} lbm baggage",
            Self::NAME
        );

        Ok(Self {
            declaration,
            passengers,
            mass_per_passenger,
            baggage_per_passenger,
        })
    }

    fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    fn evaluate(&self, inputs: &Values) -> Result<Values, EvaluationError> {
        let wing = self.cargo(inputs, Variable::WingCargo)?;
        let misc = self.cargo(inputs, Variable::MiscCargo)?;

        let count = f64::from(self.passengers);
        let passenger = self.mass_per_passenger * count;
        let baggage = self.baggage_per_passenger * count;
        let payload = passenger + baggage;
        let cargo = wing + misc;

        let scalar = |value: f64| Array1::from_elem(1, value);
        Ok(Values::new()
            .with(Variable::PassengerMass, scalar(passenger))
            .with(Variable::BaggageMass, scalar(baggage))
            .with(Variable::PassengerPayloadMass, scalar(payload))
            .with(Variable::CargoMass, scalar(cargo))
            .with(Variable::TotalPayloadMass, scalar(payload + cargo)))
    }
}

//! Fuel burned while taxiing to the runway.

use ndarray::Array1;
use sortie_core::{
    Component, ConfigurationError, ConfigurationStore, Declaration, EvaluationError, Jacobian,
    Structure, Unit, Values, Variable, VariableRegistry,
    constraint::{Requirement, require},
};
use uom::si::{f64::Time, time::second};

/// Computes taxi fuel consumption and the resulting aircraft mass.
///
/// With a fuel flow rate `flow` (negative while burning) held for the
/// configured taxi duration `Δt`:
///
/// ```text
/// consumed[i] = -flow[i] · Δt
/// mass[i]     = gross_mass - consumed[i]
/// ```
///
/// The taxi duration is a fixed option read at configuration time from
/// `mission:taxi:duration`, falling back to the registry default.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxiFuel {
    declaration: Declaration,
    duration: f64,
}

impl TaxiFuel {
    pub const NAME: &'static str = "TaxiFuelComponent";

    /// Returns the configured taxi duration.
    #[must_use]
    pub fn duration(&self) -> Time {
        Time::new::<second>(self.duration)
    }

    /// Returns the validated fuel flow and gross mass.
    fn inputs<'a>(&self, inputs: &'a Values) -> Result<(&'a Array1<f64>, f64), EvaluationError> {
        let flow = self
            .declaration
            .input_values(inputs, Variable::FuelFlowRateNegativeTotal)?;
        require(Self::NAME, Variable::FuelFlowRateNegativeTotal, flow, Requirement::Finite)?;
        let gross_mass = self
            .declaration
            .input_values(inputs, Variable::GrossMass)?;
        require(Self::NAME, Variable::GrossMass, gross_mass, Requirement::StrictlyPositive)?;
        Ok((flow, gross_mass[0]))
    }
}

impl Component for TaxiFuel {
    fn configure(
        node_count: usize,
        registry: &VariableRegistry,
        options: &ConfigurationStore,
    ) -> Result<Self, ConfigurationError> {
        let duration = options
            .scalar_or_default(Variable::TaxiDuration, Unit::Second, registry)
            .map_err(|source| ConfigurationError::Option {
                component: Self::NAME,
                source,
            })?;
        // A zero duration would leave both declared flow partials identically zero.
        if !Requirement::StrictlyPositive.is_met(duration) {
            return Err(ConfigurationError::InvalidOption {
                component: Self::NAME,
                variable: Variable::TaxiDuration,
                value: duration,
                requirement: Requirement::StrictlyPositive,
            });
        }

        let declaration = Declaration::builder(Self::NAME, node_count)
            .input(Variable::FuelFlowRateNegativeTotal)
            .input(Variable::GrossMass)
            .output(Variable::TaxiFuelConsumed)
            .output(Variable::Mass)
            .partial(
                Variable::TaxiFuelConsumed,
                Variable::FuelFlowRateNegativeTotal,
                Structure::DiagonalPerNode,
            )
            .partial(
                Variable::Mass,
                Variable::FuelFlowRateNegativeTotal,
                Structure::DiagonalPerNode,
            )
            .constant_partial(Variable::Mass, Variable::GrossMass, Structure::DenseBlock, 1.0)
            .build(registry)?;

        log::debug!("configured {} for {node_count} nodes, taxi duration {duration} s", Self::NAME);

        Ok(Self {
            declaration,
            duration,
        })
    }

    fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    fn evaluate(&self, inputs: &Values) -> Result<Values, EvaluationError> {
        let (flow, gross_mass) = self.inputs(inputs)?;

        let consumed = flow.mapv(|f| -f * self.duration);
        let mass = consumed.mapv(|c| gross_mass - c);

        Ok(Values::new()
            .with(Variable::TaxiFuelConsumed, consumed)
            .with(Variable::Mass, mass))
    }

    fn jacobian(&self, inputs: &Values) -> Result<Jacobian, EvaluationError> {
        let nodes = self.inputs(inputs)?.0.len();
        let dt = self.duration;

        Ok(Jacobian::new()
            .with(
                Variable::TaxiFuelConsumed,
                Variable::FuelFlowRateNegativeTotal,
                Array1::from_elem(nodes, -dt),
            )
            .with(
                Variable::Mass,
                Variable::FuelFlowRateNegativeTotal,
                Array1::from_elem(nodes, dt),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;
    use sortie_core::{ShapeKind, TaggedValue, component::DomainError};
    use uom::si::time::minute;

    fn ten_minutes() -> ConfigurationStore {
        ConfigurationStore::new().with(
            Variable::TaxiDuration,
            TaggedValue::scalar(10.0, Unit::Minute),
        )
    }

    fn taxi(nodes: usize) -> TaxiFuel {
        TaxiFuel::configure(nodes, &VariableRegistry::standard(), &ten_minutes()).unwrap()
    }

    #[test]
    fn burns_fuel_for_the_taxi_duration() {
        let taxi = taxi(3);
        assert_relative_eq!(taxi.duration().get::<minute>(), 10.0);

        let inputs = Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![-10.0, -10.0, -10.0])
            .with_scalar(Variable::GrossMass, 175_400.0);
        let outputs = taxi.evaluate(&inputs).unwrap();

        let consumed = outputs.get(Variable::TaxiFuelConsumed).unwrap();
        let mass = outputs.get(Variable::Mass).unwrap();
        for i in 0..3 {
            assert_relative_eq!(consumed[i], 6000.0);
            assert_relative_eq!(mass[i], 169_400.0);
        }
    }

    #[test]
    fn partials_are_scaled_by_duration() {
        let taxi = taxi(3);
        let inputs = Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![-10.0, -12.0, -8.0])
            .with_scalar(Variable::GrossMass, 175_400.0);

        let jacobian = taxi.jacobian(&inputs).unwrap();
        assert_eq!(
            jacobian.get(Variable::TaxiFuelConsumed, Variable::FuelFlowRateNegativeTotal),
            Some(&array![-600.0, -600.0, -600.0])
        );
        assert_eq!(
            jacobian.get(Variable::Mass, Variable::FuelFlowRateNegativeTotal),
            Some(&array![600.0, 600.0, 600.0])
        );

        // The gross mass block is constant and lives in the declaration.
        assert!(!jacobian.contains(Variable::Mass, Variable::GrossMass));
        let constant = taxi
            .declaration()
            .partial(Variable::Mass, Variable::GrossMass)
            .and_then(|p| p.constant().cloned());
        assert_eq!(constant, Some(array![1.0, 1.0, 1.0]));
    }

    #[test]
    fn default_duration_comes_from_the_registry() {
        let taxi = TaxiFuel::configure(
            2,
            &VariableRegistry::standard(),
            &ConfigurationStore::new(),
        )
        .unwrap();
        assert_relative_eq!(taxi.duration().get::<second>(), 0.1677 * 3600.0, epsilon = 1e-9);
    }

    #[test]
    fn non_positive_duration_fails_configuration() {
        for minutes in [-1.0, 0.0] {
            let options = ConfigurationStore::new().with(
                Variable::TaxiDuration,
                TaggedValue::scalar(minutes, Unit::Minute),
            );
            let err = TaxiFuel::configure(2, &VariableRegistry::standard(), &options).unwrap_err();
            assert!(matches!(
                err,
                ConfigurationError::InvalidOption {
                    variable: Variable::TaxiDuration,
                    requirement: Requirement::StrictlyPositive,
                    ..
                }
            ));
        }
    }

    #[test]
    fn duration_must_be_a_time() {
        let options = ConfigurationStore::new().with(
            Variable::TaxiDuration,
            TaggedValue::scalar(10.0, Unit::Foot),
        );
        let err = TaxiFuel::configure(2, &VariableRegistry::standard(), &options).unwrap_err();
        assert!(matches!(err, ConfigurationError::Option { .. }));
    }

    #[test]
    fn zero_nodes_fails_configuration() {
        let err = TaxiFuel::configure(0, &VariableRegistry::standard(), &ten_minutes()).unwrap_err();
        assert!(matches!(err, ConfigurationError::NonPositiveNodeCount { .. }));
    }

    #[test]
    fn missing_registry_entry_fails_configuration() {
        let mut registry = VariableRegistry::empty();
        for meta in VariableRegistry::standard().iter() {
            if meta.variable != Variable::TaxiFuelConsumed {
                registry.register(*meta);
            }
        }
        let err = TaxiFuel::configure(2, &registry, &ten_minutes()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownVariable {
                component: TaxiFuel::NAME,
                variable: Variable::TaxiFuelConsumed,
            }
        );
    }

    #[test]
    fn invalid_inputs_are_domain_errors() {
        let taxi = taxi(2);

        let nan_flow = Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![-1.0, f64::NAN])
            .with_scalar(Variable::GrossMass, 1000.0);
        let err = taxi.evaluate(&nan_flow).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Domain(DomainError {
                node: 1,
                requirement: Requirement::Finite,
                ..
            })
        ));
        assert!(taxi.jacobian(&nan_flow).is_err());

        let zero_mass = Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![-1.0, -1.0])
            .with_scalar(Variable::GrossMass, 0.0);
        let err = taxi.evaluate(&zero_mass).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Domain(DomainError {
                variable: Variable::GrossMass,
                requirement: Requirement::StrictlyPositive,
                ..
            })
        ));
        assert_eq!(taxi.jacobian(&zero_mass), Err(err));
    }

    #[test]
    fn per_node_outputs_follow_the_registry_shape() {
        let taxi = taxi(4);
        let registry = VariableRegistry::standard();
        for output in taxi.declaration().outputs() {
            let meta = registry.get(output.variable).unwrap();
            assert_eq!(meta.shape, ShapeKind::PerNode);
            assert_eq!(output.len(), 4);
        }
    }
}

//! Central-difference verification of analytic partials.

use ndarray::{Array1, Array2, s};
use sortie_core::{Component, EvaluationError, Values, Variable};
use thiserror::Error;

use crate::evaluate::{self, Evaluator};

/// Configuration for [`check_partials`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Step size relative to `max(|x|, 1)`.
    pub step: f64,
    pub rel_tol: f64,
    pub abs_tol: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            step: 1e-6,
            rel_tol: 1e-6,
            abs_tol: 1e-8,
        }
    }
}

impl Config {
    /// Validates that the step is positive and the tolerances non-negative.
    ///
    /// # Errors
    ///
    /// Returns an error if any field is out of range or non-finite.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err("step must be finite and positive");
        }
        if !self.rel_tol.is_finite() || self.rel_tol < 0.0 {
            return Err("rel_tol must be finite and non-negative");
        }
        if !self.abs_tol.is_finite() || self.abs_tol < 0.0 {
            return Err("abs_tol must be finite and non-negative");
        }
        Ok(())
    }
}

/// Errors that can occur while checking partials.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error(transparent)]
    Evaluate(#[from] evaluate::Error),
}

/// The comparison for one declared `(output, input)` block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockCheck {
    pub of: Variable,
    pub wrt: Variable,
    pub max_abs_error: f64,
    pub max_rel_error: f64,
    /// The largest analytic or numeric magnitude in the block.
    pub max_magnitude: f64,
    pub within_tolerance: bool,
}

/// The outcome of [`check_partials`].
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub blocks: Vec<BlockCheck>,
    /// Blocks outside the pattern where central differences found a nonzero.
    pub undeclared_nonzeros: Vec<(Variable, Variable)>,
    /// Declared blocks that are zero both analytically and numerically.
    pub declared_zeros: Vec<(Variable, Variable)>,
    /// Input elements differenced on one side only, because the other side
    /// left the component's domain.
    pub one_sided: Vec<(Variable, usize)>,
}

impl Report {
    /// Returns `true` if every declared block matches and the pattern is tight.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.blocks.iter().all(|b| b.within_tolerance)
            && self.undeclared_nonzeros.is_empty()
            && self.declared_zeros.is_empty()
    }

    #[must_use]
    pub fn block(&self, of: Variable, wrt: Variable) -> Option<&BlockCheck> {
        self.blocks.iter().find(|b| b.of == of && b.wrt == wrt)
    }
}

/// Compares the analytic Jacobian with central differences at `inputs`.
///
/// Each input element is perturbed by `±step · max(|x|, 1)`.
/// If one of the two perturbed points raises a domain error, the element
/// falls back to a one-sided difference and is listed in
/// [`Report::one_sided`].
/// Every `(output, input)` pair is then classified: declared pairs are
/// compared element by element, undeclared pairs must be numerically zero.
///
/// # Errors
///
/// Returns an error if `config` is invalid, the evaluation at `inputs`
/// fails, or a perturbed evaluation fails on both sides.
pub fn check_partials<C: Component>(
    evaluator: &Evaluator<C>,
    inputs: &Values,
    config: &Config,
) -> Result<Report, Error> {
    config
        .validate()
        .map_err(|reason| Error::InvalidConfig { reason })?;

    let analytic = evaluator.sparse_jacobian(inputs)?.to_dense();
    let (numeric, one_sided) = central_differences(evaluator, inputs, config.step)?;

    let layout = evaluator.layout();
    let declaration = evaluator.declaration();
    let mut report = Report {
        blocks: Vec::new(),
        undeclared_nonzeros: Vec::new(),
        declared_zeros: Vec::new(),
        one_sided,
    };

    for row in layout.rows() {
        for col in layout.cols() {
            let a = analytic.slice(s![row.range(), col.range()]);
            let n = numeric.slice(s![row.range(), col.range()]);
            let pair = (row.variable, col.variable);

            if declaration.partial(row.variable, col.variable).is_none() {
                if n.iter().any(|v| v.abs() > config.abs_tol) {
                    report.undeclared_nonzeros.push(pair);
                }
                continue;
            }

            let mut check = BlockCheck {
                of: row.variable,
                wrt: col.variable,
                max_abs_error: 0.0,
                max_rel_error: 0.0,
                max_magnitude: 0.0,
                within_tolerance: true,
            };
            for (&a, &n) in a.iter().zip(n.iter()) {
                let error = (a - n).abs();
                let scale = a.abs().max(n.abs());
                check.max_abs_error = check.max_abs_error.max(error);
                check.max_magnitude = check.max_magnitude.max(scale);
                if scale > 0.0 {
                    check.max_rel_error = check.max_rel_error.max(error / scale);
                }
                if error > config.abs_tol + config.rel_tol * scale {
                    check.within_tolerance = false;
                }
            }
            if check.max_magnitude <= config.abs_tol {
                report.declared_zeros.push(pair);
            }
            report.blocks.push(check);
        }
    }

    log::debug!(
        "checked {} partials of `{}`: {} undeclared nonzeros, {} declared zeros",
        report.blocks.len(),
        declaration.name(),
        report.undeclared_nonzeros.len(),
        report.declared_zeros.len(),
    );

    Ok(report)
}

fn central_differences<C: Component>(
    evaluator: &Evaluator<C>,
    inputs: &Values,
    step: f64,
) -> Result<(Array2<f64>, Vec<(Variable, usize)>), Error> {
    let layout = evaluator.layout();
    let center = layout.flatten_outputs(&evaluator.evaluate(inputs)?);
    let mut numeric = Array2::zeros(layout.shape());
    let mut one_sided = Vec::new();

    for col in layout.cols() {
        let Some(base) = inputs.get(col.variable) else {
            continue;
        };
        for j in 0..col.len {
            let x = base[j];
            let h = step * x.abs().max(1.0);

            let plus = evaluate_perturbed(evaluator, inputs, col.variable, j, x + h);
            let minus = evaluate_perturbed(evaluator, inputs, col.variable, j, x - h);
            let derivative = match (plus, minus) {
                (Ok(plus), Ok(minus)) => (plus - minus) / (2.0 * h),
                (Ok(plus), Err(err)) if is_domain(&err) => {
                    one_sided.push((col.variable, j));
                    (&plus - &center) / h
                }
                (Err(err), Ok(minus)) if is_domain(&err) => {
                    one_sided.push((col.variable, j));
                    (&center - &minus) / h
                }
                (Err(err), _) | (_, Err(err)) => return Err(err.into()),
            };

            numeric.column_mut(col.offset + j).assign(&derivative);
        }
    }

    if !one_sided.is_empty() {
        log::debug!(
            "`{}`: {} input elements differenced one-sided at the domain boundary",
            evaluator.declaration().name(),
            one_sided.len(),
        );
    }

    Ok((numeric, one_sided))
}

fn is_domain(err: &evaluate::Error) -> bool {
    matches!(err, evaluate::Error::Evaluation(EvaluationError::Domain(_)))
}

fn evaluate_perturbed<C: Component>(
    evaluator: &Evaluator<C>,
    inputs: &Values,
    variable: Variable,
    index: usize,
    value: f64,
) -> Result<Array1<f64>, evaluate::Error> {
    let mut perturbed = inputs.clone();
    if let Some(values) = perturbed.get_mut(variable) {
        values[index] = value;
    }
    let outputs = evaluator.evaluate(&perturbed)?;
    Ok(evaluator.layout().flatten_outputs(&outputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use sortie_components::{CargoMass, TaxiFuel};
    use sortie_core::{
        ConfigurationError, ConfigurationStore, Declaration, EvaluationError, Jacobian, Structure,
        TaggedValue, Unit, VariableRegistry,
    };

    #[test]
    fn taxi_partials_match_central_differences() {
        let options = ConfigurationStore::new()
            .with(Variable::TaxiDuration, TaggedValue::scalar(10.0, Unit::Minute));
        let evaluator: Evaluator<TaxiFuel> =
            Evaluator::configure(3, &VariableRegistry::standard(), &options).unwrap();
        let inputs = Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![-10.0, -7.5, -12.0])
            .with_scalar(Variable::GrossMass, 175_400.0);

        let report = check_partials(&evaluator, &inputs, &Config::default()).unwrap();
        assert!(report.is_consistent(), "{report:#?}");
        assert_eq!(report.blocks.len(), 3);

        let block = report
            .block(Variable::TaxiFuelConsumed, Variable::FuelFlowRateNegativeTotal)
            .unwrap();
        assert!(block.max_rel_error < 1e-6);
    }

    #[test]
    fn domain_boundary_falls_back_to_one_sided_differences() {
        let options = ConfigurationStore::new()
            .with(Variable::NumPassengers, TaggedValue::scalar(10.0, Unit::Unitless));
        let evaluator: Evaluator<CargoMass> =
            Evaluator::configure(1, &VariableRegistry::standard(), &options).unwrap();
        let inputs = Values::new()
            .with_scalar(Variable::WingCargo, 0.0)
            .with_scalar(Variable::MiscCargo, 200.0);

        let report = check_partials(&evaluator, &inputs, &Config::default()).unwrap();
        assert!(report.is_consistent(), "{report:#?}");
        assert_eq!(report.one_sided, vec![(Variable::WingCargo, 0)]);

        let block = report
            .block(Variable::CargoMass, Variable::WingCargo)
            .unwrap();
        assert!(block.within_tolerance);
    }

    #[test]
    fn interior_points_use_central_differences() {
        let evaluator: Evaluator<TaxiFuel> =
            Evaluator::configure(2, &VariableRegistry::standard(), &ConfigurationStore::new())
                .unwrap();
        let inputs = Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![-1.0, -2.0])
            .with_scalar(Variable::GrossMass, 1000.0);

        let report = check_partials(&evaluator, &inputs, &Config::default()).unwrap();
        assert!(report.one_sided.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let options = ConfigurationStore::new();
        let evaluator: Evaluator<TaxiFuel> =
            Evaluator::configure(1, &VariableRegistry::standard(), &options).unwrap();
        let config = Config {
            step: 0.0,
            ..Config::default()
        };
        let err = check_partials(&evaluator, &Values::new(), &config).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidConfig {
                reason: "step must be finite and positive"
            }
        );
    }

    /// `y = 3x` with a wrong analytic partial, a missing block, and a zero block.
    #[derive(Debug, Clone)]
    struct Sloppy {
        declaration: Declaration,
    }

    impl Component for Sloppy {
        fn configure(
            node_count: usize,
            registry: &VariableRegistry,
            _options: &ConfigurationStore,
        ) -> Result<Self, ConfigurationError> {
            let declaration = Declaration::builder("Sloppy", node_count)
                .input(Variable::FuelFlowRateNegativeTotal)
                .input(Variable::GrossMass)
                .input(Variable::WingCargo)
                .output(Variable::Mass)
                .partial(Variable::Mass, Variable::FuelFlowRateNegativeTotal, Structure::DiagonalPerNode)
                .constant_partial(Variable::Mass, Variable::WingCargo, Structure::DenseBlock, 0.0)
                .build(registry)?;
            Ok(Self { declaration })
        }

        fn declaration(&self) -> &Declaration {
            &self.declaration
        }

        fn evaluate(&self, inputs: &Values) -> Result<Values, EvaluationError> {
            let flow = self
                .declaration
                .input_values(inputs, Variable::FuelFlowRateNegativeTotal)?;
            let gross = self.declaration.input_scalar(inputs, Variable::GrossMass)?;
            Ok(Values::new().with(Variable::Mass, flow.mapv(|f| 3.0 * f + gross)))
        }

        fn jacobian(&self, inputs: &Values) -> Result<Jacobian, EvaluationError> {
            let n = self
                .declaration
                .input_values(inputs, Variable::FuelFlowRateNegativeTotal)?
                .len();
            Ok(Jacobian::new().with(
                Variable::Mass,
                Variable::FuelFlowRateNegativeTotal,
                Array1::from_elem(n, 2.0),
            ))
        }
    }

    #[test]
    fn inconsistencies_are_reported() {
        let evaluator: Evaluator<Sloppy> =
            Evaluator::configure(2, &VariableRegistry::standard(), &ConfigurationStore::new())
                .unwrap();
        let inputs = Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![1.0, 2.0])
            .with_scalar(Variable::GrossMass, 100.0)
            .with_scalar(Variable::WingCargo, 5.0);

        let report = check_partials(&evaluator, &inputs, &Config::default()).unwrap();
        assert!(!report.is_consistent());

        let wrong = report
            .block(Variable::Mass, Variable::FuelFlowRateNegativeTotal)
            .unwrap();
        assert!(!wrong.within_tolerance);
        approx::assert_relative_eq!(wrong.max_abs_error, 1.0, max_relative = 1e-6);

        assert_eq!(
            report.undeclared_nonzeros,
            vec![(Variable::Mass, Variable::GrossMass)]
        );
        assert_eq!(
            report.declared_zeros,
            vec![(Variable::Mass, Variable::WingCargo)]
        );
    }
}

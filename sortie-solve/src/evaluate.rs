//! The component evaluation engine.

mod layout;
mod sparse;

pub use layout::{Block, Layout};
pub use sparse::{SparseJacobian, SparsityPattern};

use sortie_core::{
    Component, ConfigurationError, ConfigurationStore, Declaration, EvaluationError, Jacobian,
    TaggedValue, Values, Variable, VariableRegistry,
};
use thiserror::Error;

/// Errors that can occur when evaluating through an [`Evaluator`].
///
/// Apart from [`Error::Evaluation`], every variant means the component broke
/// its own declaration.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("`{component}` did not produce output `{variable}`")]
    MissingOutput {
        component: &'static str,
        variable: Variable,
    },

    #[error("`{component}` produced undeclared output `{variable}`")]
    UndeclaredOutput {
        component: &'static str,
        variable: Variable,
    },

    #[error("`{component}` produced {actual} values for `{variable}`, expected {expected}")]
    OutputLength {
        component: &'static str,
        variable: Variable,
        expected: usize,
        actual: usize,
    },

    #[error("`{component}` produced non-finite `{variable}` ({value}) at node {node}")]
    NonFiniteOutput {
        component: &'static str,
        variable: Variable,
        node: usize,
        value: f64,
    },

    #[error("`{component}` did not compute d`{of}`/d`{wrt}`")]
    MissingPartial {
        component: &'static str,
        of: Variable,
        wrt: Variable,
    },

    #[error("`{component}` computed d`{of}`/d`{wrt}`, which is not in its Jacobian pattern")]
    UndeclaredPartial {
        component: &'static str,
        of: Variable,
        wrt: Variable,
    },

    #[error("`{component}` recomputed d`{of}`/d`{wrt}`, which is declared constant")]
    ConstantPartial {
        component: &'static str,
        of: Variable,
        wrt: Variable,
    },

    #[error("`{component}` computed {actual} values for d`{of}`/d`{wrt}`, expected {expected}")]
    PartialLength {
        component: &'static str,
        of: Variable,
        wrt: Variable,
        expected: usize,
        actual: usize,
    },
}

/// Drives a configured [`Component`] on behalf of an optimizer.
///
/// The evaluator captures the component's constant partials once, validates
/// inputs before every call and outputs after it, and merges constant and
/// computed partials into a single Jacobian.
/// When every partial is constant, [`Component::jacobian`] is never called.
#[derive(Debug, Clone)]
pub struct Evaluator<C> {
    component: C,
    layout: Layout,
    constants: Jacobian,
}

impl<C: Component> Evaluator<C> {
    /// Wraps an already configured component.
    pub fn new(component: C) -> Self {
        let declaration = component.declaration();
        let layout = Layout::new(declaration);

        let mut constants = Jacobian::new();
        for partial in declaration.partials() {
            if let Some(values) = partial.constant() {
                constants.insert(partial.of, partial.wrt, values.clone());
            }
        }

        log::debug!(
            "evaluator for `{}`: {:?} Jacobian, {} of {} partials constant",
            declaration.name(),
            layout.shape(),
            constants.len(),
            declaration.partials().len(),
        );

        Self {
            component,
            layout,
            constants,
        }
    }

    /// Configures a component and wraps it.
    ///
    /// # Errors
    ///
    /// Returns the component's [`ConfigurationError`] unchanged.
    pub fn configure(
        node_count: usize,
        registry: &VariableRegistry,
        options: &ConfigurationStore,
    ) -> Result<Self, ConfigurationError> {
        C::configure(node_count, registry, options).map(Self::new)
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn declaration(&self) -> &Declaration {
        self.component.declaration()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Converts unit-tagged inputs to the declared units.
    ///
    /// # Errors
    ///
    /// Returns an error if an input is undeclared or has the wrong dimension.
    pub fn inputs_from_tagged<'a>(
        &self,
        inputs: impl IntoIterator<Item = (Variable, &'a TaggedValue)>,
    ) -> Result<Values, Error> {
        Ok(self.declaration().inputs_from_tagged(inputs)?)
    }

    /// Evaluates the component and validates its outputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs do not match the declaration, the
    /// component fails, or the outputs do not match the declaration.
    pub fn evaluate(&self, inputs: &Values) -> Result<Values, Error> {
        let declaration = self.declaration();
        declaration.check_inputs(inputs)?;
        let outputs = self.component.evaluate(inputs)?;
        check_outputs(declaration, &outputs)?;
        Ok(outputs)
    }

    /// Evaluates the component on unit-tagged inputs.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Evaluator::inputs_from_tagged`] and [`Evaluator::evaluate`].
    pub fn evaluate_tagged<'a>(
        &self,
        inputs: impl IntoIterator<Item = (Variable, &'a TaggedValue)>,
    ) -> Result<Values, Error> {
        let inputs = self.inputs_from_tagged(inputs)?;
        self.evaluate(&inputs)
    }

    /// Returns every declared partial, constant and computed.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs do not match the declaration, the
    /// component fails, or the computed partials do not match the pattern.
    pub fn jacobian(&self, inputs: &Values) -> Result<Jacobian, Error> {
        let declaration = self.declaration();
        declaration.check_inputs(inputs)?;

        if declaration.is_jacobian_constant() {
            return Ok(self.constants.clone());
        }

        let name = declaration.name();
        let computed = self.component.jacobian(inputs)?;
        let mut merged = self.constants.clone();
        for (of, wrt, values) in computed.iter() {
            let partial = declaration
                .partial(of, wrt)
                .ok_or(Error::UndeclaredPartial {
                    component: name,
                    of,
                    wrt,
                })?;
            if partial.is_constant() {
                return Err(Error::ConstantPartial {
                    component: name,
                    of,
                    wrt,
                });
            }
            let expected = declaration
                .output(of)
                .map_or(0, |output| partial.structure.nonzeros(output.shape));
            if values.len() != expected {
                return Err(Error::PartialLength {
                    component: name,
                    of,
                    wrt,
                    expected,
                    actual: values.len(),
                });
            }
            merged.insert(of, wrt, values.clone());
        }

        if let Some(missing) = declaration
            .partials()
            .iter()
            .find(|p| !merged.contains(p.of, p.wrt))
        {
            return Err(Error::MissingPartial {
                component: name,
                of: missing.of,
                wrt: missing.wrt,
            });
        }

        Ok(merged)
    }

    /// Returns the coordinates of every structural nonzero.
    ///
    /// Partials are emitted in declaration order, and within a partial in
    /// the order its values are stored.
    pub fn pattern(&self) -> SparsityPattern {
        let declaration = self.declaration();
        let mut rows = Vec::new();
        let mut cols = Vec::new();

        for partial in declaration.partials() {
            let (Some(row), Some(col), Some(output)) = (
                self.layout.row(partial.of),
                self.layout.col(partial.wrt),
                declaration.output(partial.of),
            ) else {
                continue;
            };
            for (r, c) in partial.structure.coordinates(output.shape) {
                rows.push(row.offset + r);
                cols.push(col.offset + c);
            }
        }

        SparsityPattern {
            rows,
            cols,
            shape: self.layout.shape(),
        }
    }

    /// Evaluates the Jacobian and assembles it against [`Evaluator::pattern`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Evaluator::jacobian`].
    pub fn sparse_jacobian(&self, inputs: &Values) -> Result<SparseJacobian, Error> {
        let jacobian = self.jacobian(inputs)?;
        let SparsityPattern { rows, cols, shape } = self.pattern();

        let mut values = Vec::with_capacity(rows.len());
        for partial in self.declaration().partials() {
            let block = jacobian
                .get(partial.of, partial.wrt)
                .ok_or(Error::MissingPartial {
                    component: self.declaration().name(),
                    of: partial.of,
                    wrt: partial.wrt,
                })?;
            values.extend(block.iter().copied());
        }

        Ok(SparseJacobian {
            rows,
            cols,
            values,
            shape,
        })
    }
}

fn check_outputs(declaration: &Declaration, outputs: &Values) -> Result<(), Error> {
    let component = declaration.name();

    if let Some(variable) = outputs.variables().find(|&v| declaration.output(v).is_none()) {
        return Err(Error::UndeclaredOutput {
            component,
            variable,
        });
    }

    for decl in declaration.outputs() {
        let variable = decl.variable;
        let values = outputs.get(variable).ok_or(Error::MissingOutput {
            component,
            variable,
        })?;
        if values.len() != decl.len() {
            return Err(Error::OutputLength {
                component,
                variable,
                expected: decl.len(),
                actual: values.len(),
            });
        }
        if let Some((node, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFiniteOutput {
                component,
                variable,
                node,
                value,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::{Array1, array};
    use sortie_components::{CargoMass, TaxiFuel};
    use sortie_core::{Structure, Unit};

    fn taxi(nodes: usize) -> Evaluator<TaxiFuel> {
        let options = ConfigurationStore::new().with(
            Variable::TaxiDuration,
            TaggedValue::scalar(600.0, Unit::Second),
        );
        Evaluator::configure(nodes, &VariableRegistry::standard(), &options).unwrap()
    }

    fn taxi_inputs() -> Values {
        Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![-10.0, -10.0, -10.0])
            .with_scalar(Variable::GrossMass, 175_400.0)
    }

    /// A component that can be told to break its own declaration.
    #[derive(Debug, Clone)]
    struct Faulty {
        declaration: Declaration,
        fault: Fault,
    }

    #[derive(Debug, Clone, Copy)]
    enum Fault {
        Healthy,
        ExtraOutput,
        ShortOutput,
        NanOutput,
        SkipPartial,
        ExtraPartial,
        RecomputeConstant,
    }

    impl Faulty {
        fn new(fault: Fault) -> Self {
            let declaration = Declaration::builder("Faulty", 2)
                .input(Variable::FuelFlowRateNegativeTotal)
                .input(Variable::GrossMass)
                .output(Variable::Mass)
                .partial(Variable::Mass, Variable::FuelFlowRateNegativeTotal, Structure::DiagonalPerNode)
                .constant_partial(Variable::Mass, Variable::GrossMass, Structure::DenseBlock, 1.0)
                .build(&VariableRegistry::standard())
                .unwrap();
            Self { declaration, fault }
        }
    }

    impl Component for Faulty {
        fn configure(
            _node_count: usize,
            _registry: &VariableRegistry,
            _options: &ConfigurationStore,
        ) -> Result<Self, ConfigurationError> {
            Ok(Self::new(Fault::Healthy))
        }

        fn declaration(&self) -> &Declaration {
            &self.declaration
        }

        fn evaluate(&self, _inputs: &Values) -> Result<Values, EvaluationError> {
            let outputs = match self.fault {
                Fault::ShortOutput => Values::new().with(Variable::Mass, array![1.0]),
                Fault::NanOutput => Values::new().with(Variable::Mass, array![1.0, f64::NAN]),
                Fault::ExtraOutput => Values::new()
                    .with(Variable::Mass, array![1.0, 1.0])
                    .with_scalar(Variable::CargoMass, 1.0),
                _ => Values::new().with(Variable::Mass, array![1.0, 1.0]),
            };
            Ok(outputs)
        }

        fn jacobian(&self, _inputs: &Values) -> Result<Jacobian, EvaluationError> {
            let diagonal = Jacobian::new().with(
                Variable::Mass,
                Variable::FuelFlowRateNegativeTotal,
                array![2.0, 2.0],
            );
            Ok(match self.fault {
                Fault::SkipPartial => Jacobian::new(),
                Fault::ExtraPartial => diagonal.with(Variable::CargoMass, Variable::GrossMass, array![1.0]),
                Fault::RecomputeConstant => diagonal.with(Variable::Mass, Variable::GrossMass, array![1.0, 1.0]),
                _ => diagonal,
            })
        }
    }

    fn faulty_inputs() -> Values {
        Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![-1.0, -1.0])
            .with_scalar(Variable::GrossMass, 10.0)
    }

    #[test]
    fn assembles_constant_and_computed_partials() {
        let evaluator = taxi(3);
        let jacobian = evaluator.jacobian(&taxi_inputs()).unwrap();

        assert_eq!(jacobian.len(), 3);
        assert_eq!(
            jacobian.get(Variable::Mass, Variable::GrossMass),
            Some(&array![1.0, 1.0, 1.0])
        );
        assert_eq!(
            jacobian.get(Variable::TaxiFuelConsumed, Variable::FuelFlowRateNegativeTotal),
            Some(&array![-600.0, -600.0, -600.0])
        );
    }

    #[test]
    fn pattern_lays_out_blocks_in_declaration_order() {
        let evaluator = taxi(3);

        // Rows: consumed 0..3, mass 3..6. Columns: flow 0..3, gross mass 3.
        let pattern = evaluator.pattern();
        assert_eq!(pattern.shape, (6, 4));
        assert_eq!(pattern.rows, vec![0, 1, 2, 3, 4, 5, 3, 4, 5]);
        assert_eq!(pattern.cols, vec![0, 1, 2, 0, 1, 2, 3, 3, 3]);

        let dense = evaluator.sparse_jacobian(&taxi_inputs()).unwrap().to_dense();
        assert_eq!(dense[[1, 1]], -600.0);
        assert_eq!(dense[[1, 0]], 0.0);
        assert_eq!(dense[[4, 1]], 600.0);
        assert_eq!(dense[[5, 3]], 1.0);
    }

    #[test]
    fn constant_jacobian_skips_the_component() {
        let options = ConfigurationStore::new()
            .with(Variable::NumPassengers, TaggedValue::scalar(10.0, Unit::Unitless));
        let evaluator: Evaluator<CargoMass> =
            Evaluator::configure(1, &VariableRegistry::standard(), &options).unwrap();
        let inputs = Values::new()
            .with_scalar(Variable::WingCargo, 1.0)
            .with_scalar(Variable::MiscCargo, 2.0);

        let sparse = evaluator.sparse_jacobian(&inputs).unwrap();
        assert_eq!(sparse.values, vec![1.0; 4]);

        // Rows: passenger, baggage, payload, cargo, total.
        assert_eq!(sparse.shape, (5, 2));
        assert_eq!(sparse.rows, vec![3, 3, 4, 4]);
        assert_eq!(sparse.cols, vec![0, 1, 0, 1]);
    }

    #[test]
    fn tagged_inputs_are_converted() {
        let evaluator = taxi(3);
        let flow = TaggedValue::scalar(-36_000.0, Unit::PoundMassPerHour);
        let gross = TaggedValue::scalar(175_400.0, Unit::PoundMass);

        let outputs = evaluator
            .evaluate_tagged([
                (Variable::FuelFlowRateNegativeTotal, &flow),
                (Variable::GrossMass, &gross),
            ])
            .unwrap();
        let mass: &Array1<f64> = outputs.get(Variable::Mass).unwrap();
        for &m in mass {
            approx::assert_relative_eq!(m, 169_400.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn inputs_are_checked_before_the_component_runs() {
        let evaluator = taxi(3);
        let inputs = Values::new().with(Variable::FuelFlowRateNegativeTotal, array![-1.0, -1.0, -1.0]);
        assert!(matches!(
            evaluator.evaluate(&inputs),
            Err(Error::Evaluation(EvaluationError::MissingInput { .. }))
        ));
    }

    #[test]
    fn well_behaved_component_passes() {
        let evaluator = Evaluator::new(Faulty::new(Fault::Healthy));
        assert!(evaluator.evaluate(&faulty_inputs()).is_ok());
        assert!(evaluator.jacobian(&faulty_inputs()).is_ok());
    }

    #[test]
    fn output_violations_are_reported() {
        let cases = [
            (Fault::ExtraOutput, "UndeclaredOutput"),
            (Fault::ShortOutput, "OutputLength"),
            (Fault::NanOutput, "NonFiniteOutput"),
        ];
        for (fault, expected) in cases {
            let err = Evaluator::new(Faulty::new(fault))
                .evaluate(&faulty_inputs())
                .unwrap_err();
            assert!(format!("{err:?}").starts_with(expected), "{fault:?}: {err:?}");
        }
    }

    #[test]
    fn partial_violations_are_reported() {
        let cases = [
            (Fault::SkipPartial, "MissingPartial"),
            (Fault::ExtraPartial, "UndeclaredPartial"),
            (Fault::RecomputeConstant, "ConstantPartial"),
        ];
        for (fault, expected) in cases {
            let err = Evaluator::new(Faulty::new(fault))
                .jacobian(&faulty_inputs())
                .unwrap_err();
            assert!(format!("{err:?}").starts_with(expected), "{fault:?}: {err:?}");
        }
    }
}

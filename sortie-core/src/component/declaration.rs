use ndarray::Array1;

use crate::{
    nodes::{NodeCount, Shape, Structure, broadcast},
    units::{TaggedValue, Unit},
    variable::{Variable, VariableRegistry},
};

use super::{ConfigurationError, EvaluationError, Role, Values};

/// A declared input or output, with the unit and shape taken from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDecl {
    pub variable: Variable,
    pub unit: Unit,
    pub shape: Shape,
}

impl VariableDecl {
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }
}

/// One declared block of the Jacobian pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialDecl {
    pub of: Variable,
    pub wrt: Variable,
    pub structure: Structure,
    constant: Option<Array1<f64>>,
}

impl PartialDecl {
    /// Returns the fixed values of a constant partial.
    #[must_use]
    pub fn constant(&self) -> Option<&Array1<f64>> {
        self.constant.as_ref()
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }
}

/// The validated interface of a configured component.
///
/// A declaration is only obtainable through [`DeclarationBuilder::build`],
/// so every value of this type has a positive node count, registered
/// variables, and a Jacobian pattern that fits the declared shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    name: &'static str,
    nodes: NodeCount,
    inputs: Vec<VariableDecl>,
    outputs: Vec<VariableDecl>,
    partials: Vec<PartialDecl>,
}

impl Declaration {
    /// Starts a declaration for the component `name` with `node_count` nodes.
    #[must_use]
    pub fn builder(name: &'static str, node_count: usize) -> DeclarationBuilder {
        DeclarationBuilder {
            name,
            node_count,
            inputs: Vec::new(),
            outputs: Vec::new(),
            partials: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn nodes(&self) -> NodeCount {
        self.nodes
    }

    #[must_use]
    pub fn inputs(&self) -> &[VariableDecl] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[VariableDecl] {
        &self.outputs
    }

    #[must_use]
    pub fn partials(&self) -> &[PartialDecl] {
        &self.partials
    }

    #[must_use]
    pub fn input(&self, variable: Variable) -> Option<&VariableDecl> {
        self.inputs.iter().find(|decl| decl.variable == variable)
    }

    #[must_use]
    pub fn output(&self, variable: Variable) -> Option<&VariableDecl> {
        self.outputs.iter().find(|decl| decl.variable == variable)
    }

    #[must_use]
    pub fn partial(&self, of: Variable, wrt: Variable) -> Option<&PartialDecl> {
        self.partials.iter().find(|p| p.of == of && p.wrt == wrt)
    }

    /// Returns `true` if every declared partial is constant.
    #[must_use]
    pub fn is_jacobian_constant(&self) -> bool {
        self.partials.iter().all(PartialDecl::is_constant)
    }

    /// Returns the values of a declared input, checking presence and length.
    ///
    /// # Errors
    ///
    /// Returns an error if `variable` is not a declared input, is absent from
    /// `inputs`, or has the wrong number of values.
    pub fn input_values<'a>(
        &self,
        inputs: &'a Values,
        variable: Variable,
    ) -> Result<&'a Array1<f64>, EvaluationError> {
        let decl = self
            .input(variable)
            .ok_or(EvaluationError::UndeclaredInput {
                component: self.name,
                variable,
            })?;
        let values = inputs.get(variable).ok_or(EvaluationError::MissingInput {
            component: self.name,
            variable,
        })?;
        if values.len() != decl.len() {
            return Err(EvaluationError::LengthMismatch {
                component: self.name,
                variable,
                expected: decl.len(),
                actual: values.len(),
            });
        }
        Ok(values)
    }

    /// Returns the single value of a declared scalar input.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Declaration::input_values`].
    pub fn input_scalar(&self, inputs: &Values, variable: Variable) -> Result<f64, EvaluationError> {
        let values = self.input_values(inputs, variable)?;
        Ok(values[0])
    }

    /// Checks that `inputs` holds exactly the declared inputs with the right lengths.
    ///
    /// # Errors
    ///
    /// Returns an error for the first missing, undeclared, or mis-sized input.
    pub fn check_inputs(&self, inputs: &Values) -> Result<(), EvaluationError> {
        if let Some(variable) = inputs.variables().find(|&v| self.input(v).is_none()) {
            return Err(EvaluationError::UndeclaredInput {
                component: self.name,
                variable,
            });
        }
        for decl in &self.inputs {
            self.input_values(inputs, decl.variable)?;
        }
        Ok(())
    }

    /// Converts unit-tagged inputs into the declared units.
    ///
    /// A single value supplied for a per-node input is broadcast over every node.
    /// Lengths are otherwise left as given and checked at evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is not a declared input or its unit has
    /// the wrong dimension.
    pub fn inputs_from_tagged<'a>(
        &self,
        tagged: impl IntoIterator<Item = (Variable, &'a TaggedValue)>,
    ) -> Result<Values, EvaluationError> {
        let mut values = Values::new();
        for (variable, value) in tagged {
            let decl = self
                .input(variable)
                .ok_or(EvaluationError::UndeclaredInput {
                    component: self.name,
                    variable,
                })?;
            let array = value
                .array_in(decl.unit)
                .map_err(|source| EvaluationError::Unit {
                    component: self.name,
                    variable,
                    source,
                })?;
            let array = match decl.shape {
                Shape::Vector(n) if n > 1 && array.len() == 1 => broadcast(array[0], decl.shape),
                _ => array,
            };
            values.insert(variable, array);
        }
        Ok(values)
    }
}

/// Collects the interface of a component and validates it on [`build`](Self::build).
#[derive(Debug, Clone)]
#[must_use]
pub struct DeclarationBuilder {
    name: &'static str,
    node_count: usize,
    inputs: Vec<Variable>,
    outputs: Vec<Variable>,
    partials: Vec<(Variable, Variable, Structure, Option<f64>)>,
}

impl DeclarationBuilder {
    pub fn input(mut self, variable: Variable) -> Self {
        self.inputs.push(variable);
        self
    }

    pub fn output(mut self, variable: Variable) -> Self {
        self.outputs.push(variable);
        self
    }

    /// Declares a partial whose values are computed by [`Component::jacobian`](super::Component::jacobian).
    pub fn partial(mut self, of: Variable, wrt: Variable, structure: Structure) -> Self {
        self.partials.push((of, wrt, structure, None));
        self
    }

    /// Declares a partial whose every structural nonzero is `value`.
    pub fn constant_partial(
        mut self,
        of: Variable,
        wrt: Variable,
        structure: Structure,
        value: f64,
    ) -> Self {
        self.partials.push((of, wrt, structure, Some(value)));
        self
    }

    /// Resolves units and shapes from `registry` and validates the declaration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the node count is zero, a variable
    /// is unregistered or declared twice, or a partial names an undeclared
    /// variable, repeats a block, or does not fit the declared shapes.
    pub fn build(self, registry: &VariableRegistry) -> Result<Declaration, ConfigurationError> {
        let name = self.name;
        let nodes = NodeCount::new(self.node_count).ok_or(ConfigurationError::NonPositiveNodeCount {
            component: name,
            node_count: self.node_count,
        })?;

        let resolve = |variable: Variable| {
            registry
                .get(variable)
                .map(|meta| VariableDecl {
                    variable,
                    unit: meta.unit,
                    shape: meta.shape.resolve(nodes),
                })
                .ok_or(ConfigurationError::UnknownVariable {
                    component: name,
                    variable,
                })
        };
        let inputs = self
            .inputs
            .iter()
            .map(|&v| resolve(v))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = self
            .outputs
            .iter()
            .map(|&v| resolve(v))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = Vec::with_capacity(inputs.len() + outputs.len());
        for decl in inputs.iter().chain(&outputs) {
            if seen.contains(&decl.variable) {
                return Err(ConfigurationError::DuplicateVariable {
                    component: name,
                    variable: decl.variable,
                });
            }
            seen.push(decl.variable);
        }

        let mut partials: Vec<PartialDecl> = Vec::with_capacity(self.partials.len());
        for (of, wrt, structure, constant) in self.partials {
            let output = outputs.iter().find(|d| d.variable == of).ok_or(
                ConfigurationError::UndeclaredVariable {
                    component: name,
                    variable: of,
                    role: Role::Output,
                },
            )?;
            let input = inputs.iter().find(|d| d.variable == wrt).ok_or(
                ConfigurationError::UndeclaredVariable {
                    component: name,
                    variable: wrt,
                    role: Role::Input,
                },
            )?;
            if partials.iter().any(|p| p.of == of && p.wrt == wrt) {
                return Err(ConfigurationError::DuplicatePartial {
                    component: name,
                    of,
                    wrt,
                });
            }
            structure
                .check(output.shape, input.shape)
                .map_err(|reason| ConfigurationError::PatternMismatch {
                    component: name,
                    of,
                    wrt,
                    reason,
                })?;

            let nonzeros = structure.nonzeros(output.shape);
            partials.push(PartialDecl {
                of,
                wrt,
                structure,
                constant: constant.map(|value| Array1::from_elem(nonzeros, value)),
            });
        }

        Ok(Declaration {
            name,
            nodes,
            inputs,
            outputs,
            partials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    fn taxi_like(nodes: usize) -> DeclarationBuilder {
        Declaration::builder("Test", nodes)
            .input(Variable::FuelFlowRateNegativeTotal)
            .input(Variable::GrossMass)
            .output(Variable::Mass)
    }

    #[test]
    fn resolves_units_and_shapes_from_the_registry() {
        let decl = taxi_like(3)
            .partial(Variable::Mass, Variable::FuelFlowRateNegativeTotal, Structure::DiagonalPerNode)
            .constant_partial(Variable::Mass, Variable::GrossMass, Structure::DenseBlock, 1.0)
            .build(&VariableRegistry::standard())
            .unwrap();

        let mass = decl.output(Variable::Mass).unwrap();
        assert_eq!(mass.unit, Unit::PoundMass);
        assert_eq!(mass.shape, Shape::Vector(3));
        assert_eq!(decl.input(Variable::GrossMass).unwrap().shape, Shape::Scalar);

        let constant = decl.partial(Variable::Mass, Variable::GrossMass).unwrap();
        assert_eq!(constant.constant(), Some(&array![1.0, 1.0, 1.0]));
        assert!(!decl.is_jacobian_constant());
    }

    #[test]
    fn zero_nodes_is_a_configuration_error() {
        let err = taxi_like(0).build(&VariableRegistry::standard()).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::NonPositiveNodeCount { node_count: 0, .. }
        ));
    }

    #[test]
    fn unregistered_variables_are_rejected() {
        let err = taxi_like(2).build(&VariableRegistry::empty()).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownVariable { .. }));
    }

    #[test]
    fn a_variable_cannot_be_both_input_and_output() {
        let err = taxi_like(2)
            .output(Variable::GrossMass)
            .build(&VariableRegistry::standard())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateVariable {
                component: "Test",
                variable: Variable::GrossMass,
            }
        );
    }

    #[test]
    fn partials_must_reference_declared_variables() {
        let err = taxi_like(2)
            .partial(Variable::Mass, Variable::TaxiDuration, Structure::DenseBlock)
            .build(&VariableRegistry::standard())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UndeclaredVariable { role: Role::Input, .. }
        ));
    }

    #[test]
    fn structures_must_fit_the_shapes() {
        let err = taxi_like(2)
            .partial(Variable::Mass, Variable::GrossMass, Structure::DiagonalPerNode)
            .build(&VariableRegistry::standard())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::PatternMismatch { .. }));
    }

    #[test]
    fn duplicate_partials_are_rejected() {
        let err = taxi_like(2)
            .constant_partial(Variable::Mass, Variable::GrossMass, Structure::DenseBlock, 1.0)
            .partial(Variable::Mass, Variable::GrossMass, Structure::DenseBlock)
            .build(&VariableRegistry::standard())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicatePartial { .. }));
    }

    #[test]
    fn input_checks_report_the_problem() {
        let decl = taxi_like(2).build(&VariableRegistry::standard()).unwrap();

        let short = Values::new()
            .with(Variable::FuelFlowRateNegativeTotal, array![1.0])
            .with_scalar(Variable::GrossMass, 1.0);
        assert!(matches!(
            decl.check_inputs(&short),
            Err(EvaluationError::LengthMismatch { expected: 2, actual: 1, .. })
        ));

        let missing = Values::new().with(Variable::FuelFlowRateNegativeTotal, array![1.0, 2.0]);
        assert!(matches!(
            decl.check_inputs(&missing),
            Err(EvaluationError::MissingInput { variable: Variable::GrossMass, .. })
        ));

        let extra = missing
            .clone()
            .with_scalar(Variable::GrossMass, 1.0)
            .with_scalar(Variable::WingCargo, 1.0);
        assert!(matches!(
            decl.check_inputs(&extra),
            Err(EvaluationError::UndeclaredInput { variable: Variable::WingCargo, .. })
        ));
    }

    #[test]
    fn tagged_inputs_are_converted_and_broadcast() {
        let decl = taxi_like(3).build(&VariableRegistry::standard()).unwrap();
        let flow = TaggedValue::scalar(-2.0, Unit::PoundMassPerSecond);
        let gross = TaggedValue::scalar(1000.0, Unit::Kilogram);

        let values = decl
            .inputs_from_tagged([
                (Variable::FuelFlowRateNegativeTotal, &flow),
                (Variable::GrossMass, &gross),
            ])
            .unwrap();

        assert_eq!(values.get(Variable::FuelFlowRateNegativeTotal), Some(&array![-2.0, -2.0, -2.0]));
        let lbm = values.get(Variable::GrossMass).unwrap()[0];
        assert!((lbm - 2204.622_621_848_776).abs() < 1e-6);
        assert!(decl.check_inputs(&values).is_ok());

        let wrong = TaggedValue::scalar(1.0, Unit::Foot);
        let err = decl
            .inputs_from_tagged([(Variable::GrossMass, &wrong)])
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Unit { .. }));
    }
}

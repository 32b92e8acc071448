use std::collections::BTreeMap;

use ndarray::Array1;

use crate::variable::Variable;

/// Variable values exchanged with a component, in each variable's declared unit.
///
/// Per-node variables hold one value per node; scalar variables hold a
/// single-element array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: BTreeMap<Variable, Array1<f64>>,
}

impl Values {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `self` with `variable` set to `values`.
    #[must_use]
    pub fn with(mut self, variable: Variable, values: impl Into<Array1<f64>>) -> Self {
        self.insert(variable, values);
        self
    }

    /// Returns `self` with `variable` set to a single value.
    #[must_use]
    pub fn with_scalar(self, variable: Variable, value: f64) -> Self {
        self.with(variable, Array1::from_elem(1, value))
    }

    /// Sets `variable`, returning the values it replaced.
    pub fn insert(
        &mut self,
        variable: Variable,
        values: impl Into<Array1<f64>>,
    ) -> Option<Array1<f64>> {
        self.entries.insert(variable, values.into())
    }

    #[must_use]
    pub fn get(&self, variable: Variable) -> Option<&Array1<f64>> {
        self.entries.get(&variable)
    }

    pub fn get_mut(&mut self, variable: Variable) -> Option<&mut Array1<f64>> {
        self.entries.get_mut(&variable)
    }

    #[must_use]
    pub fn contains(&self, variable: Variable) -> bool {
        self.entries.contains_key(&variable)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &Array1<f64>)> {
        self.entries.iter().map(|(&variable, values)| (variable, values))
    }
}

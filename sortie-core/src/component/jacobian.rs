use std::collections::BTreeMap;

use ndarray::Array1;

use crate::variable::Variable;

/// Partial derivative values keyed by `(output, input)`.
///
/// Each entry holds the structural nonzeros of one declared block, ordered as
/// [`Structure::coordinates`](crate::nodes::Structure::coordinates) yields them:
/// the diagonal for a per-node block, the column for a dense block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Jacobian {
    entries: BTreeMap<(Variable, Variable), Array1<f64>>,
}

impl Jacobian {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `self` with the partial of `of` with respect to `wrt` set.
    #[must_use]
    pub fn with(mut self, of: Variable, wrt: Variable, values: impl Into<Array1<f64>>) -> Self {
        self.insert(of, wrt, values);
        self
    }

    /// Sets the partial of `of` with respect to `wrt`, returning the values it replaced.
    pub fn insert(
        &mut self,
        of: Variable,
        wrt: Variable,
        values: impl Into<Array1<f64>>,
    ) -> Option<Array1<f64>> {
        self.entries.insert((of, wrt), values.into())
    }

    #[must_use]
    pub fn get(&self, of: Variable, wrt: Variable) -> Option<&Array1<f64>> {
        self.entries.get(&(of, wrt))
    }

    #[must_use]
    pub fn contains(&self, of: Variable, wrt: Variable) -> bool {
        self.entries.contains_key(&(of, wrt))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(output, input, values)` in `(output, input)` order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, Variable, &Array1<f64>)> {
        self.entries
            .iter()
            .map(|(&(of, wrt), values)| (of, wrt, values))
    }
}

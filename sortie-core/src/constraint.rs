//! Domain checks for component inputs and options.
//!
//! Components call [`require`] on every input whose formula is only
//! physically meaningful for part of the real line, so that an invalid value
//! becomes a [`DomainError`] naming the offending node instead of a NaN
//! somewhere downstream.

use std::fmt;

use ndarray::Array1;

use crate::{component::DomainError, variable::Variable};

/// A numeric requirement on an input or option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Not NaN or infinite.
    Finite,
    /// Finite and zero or greater.
    NonNegative,
    /// Finite and greater than zero.
    StrictlyPositive,
}

impl Requirement {
    /// Returns `true` if `value` satisfies this requirement.
    #[must_use]
    pub fn is_met(self, value: f64) -> bool {
        value.is_finite()
            && match self {
                Self::Finite => true,
                Self::NonNegative => value >= 0.0,
                Self::StrictlyPositive => value > 0.0,
            }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Finite => "finite",
            Self::NonNegative => "non-negative",
            Self::StrictlyPositive => "strictly positive",
        })
    }
}

/// Checks that every element of `values` satisfies `requirement`.
///
/// # Errors
///
/// Returns a [`DomainError`] for the first node that violates the requirement.
pub fn require(
    component: &'static str,
    variable: Variable,
    values: &Array1<f64>,
    requirement: Requirement,
) -> Result<(), DomainError> {
    match values.iter().position(|&v| !requirement.is_met(v)) {
        None => Ok(()),
        Some(node) => Err(DomainError {
            component,
            variable,
            node,
            value: values[node],
            requirement,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn nan_never_passes() {
        for requirement in [
            Requirement::Finite,
            Requirement::NonNegative,
            Requirement::StrictlyPositive,
        ] {
            assert!(!requirement.is_met(f64::NAN));
            assert!(!requirement.is_met(f64::INFINITY));
        }
    }

    #[test]
    fn zero_is_non_negative_but_not_positive() {
        assert!(Requirement::NonNegative.is_met(0.0));
        assert!(!Requirement::StrictlyPositive.is_met(0.0));
    }

    #[test]
    fn reports_the_first_offending_node() {
        let values = array![1.0, 2.0, -3.0, -4.0];
        let err = require("Test", Variable::Mass, &values, Requirement::NonNegative).unwrap_err();
        assert_eq!(err.node, 2);
        assert_eq!(err.value, -3.0);
        assert_eq!(
            err.to_string(),
            "`Test` input `dynamic:mission:mass` is -3 at node 2, which is not non-negative"
        );
    }
}

use std::fmt;

use thiserror::Error;

use crate::{
    constraint::Requirement, store::StoreError, units::UnitMismatchError, variable::Variable,
};

/// Whether a variable is consumed or produced by a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Input,
    Output,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// A component declaration is malformed or incomplete.
///
/// Configuration errors are fatal to the component's setup and are never retried.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("`{component}` needs at least one node, got {node_count}")]
    NonPositiveNodeCount {
        component: &'static str,
        node_count: usize,
    },

    #[error("`{component}` references `{variable}`, which is not in the variable registry")]
    UnknownVariable {
        component: &'static str,
        variable: Variable,
    },

    #[error("`{component}` declares `{variable}` more than once")]
    DuplicateVariable {
        component: &'static str,
        variable: Variable,
    },

    #[error("`{component}` declares a partial involving `{variable}`, which is not a declared {role}")]
    UndeclaredVariable {
        component: &'static str,
        variable: Variable,
        role: Role,
    },

    #[error("`{component}` declares d`{of}`/d`{wrt}` more than once")]
    DuplicatePartial {
        component: &'static str,
        of: Variable,
        wrt: Variable,
    },

    #[error("d`{of}`/d`{wrt}` in `{component}` does not fit the declared shapes: {reason}")]
    PatternMismatch {
        component: &'static str,
        of: Variable,
        wrt: Variable,
        reason: &'static str,
    },

    #[error("`{component}` could not read option `{}`", .source.variable())]
    Option {
        component: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("`{component}` option `{variable}` is {value}, which is not {requirement}")]
    InvalidOption {
        component: &'static str,
        variable: Variable,
        value: f64,
        requirement: Requirement,
    },
}

/// A physically invalid input value reached a component.
///
/// Domain errors are propagated rather than clamped, since a clamped value
/// would corrupt the gradient information the optimizer relies on.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("`{component}` input `{variable}` is {value} at node {node}, which is not {requirement}")]
pub struct DomainError {
    pub component: &'static str,
    pub variable: Variable,
    pub node: usize,
    pub value: f64,
    pub requirement: Requirement,
}

/// Errors that can occur when evaluating a configured component.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EvaluationError {
    #[error("`{component}` did not receive input `{variable}`")]
    MissingInput {
        component: &'static str,
        variable: Variable,
    },

    #[error("`{component}` expected {expected} values for `{variable}`, got {actual}")]
    LengthMismatch {
        component: &'static str,
        variable: Variable,
        expected: usize,
        actual: usize,
    },

    #[error("`{component}` does not declare input `{variable}`")]
    UndeclaredInput {
        component: &'static str,
        variable: Variable,
    },

    #[error("`{component}` could not convert input `{variable}`")]
    Unit {
        component: &'static str,
        variable: Variable,
        #[source]
        source: UnitMismatchError,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

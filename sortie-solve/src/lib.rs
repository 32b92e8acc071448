//! Evaluation engine and derivative checks for Sortie components.
//!
//! An [`Evaluator`] wraps a configured component, validates everything that
//! crosses its boundary, and assembles the full sparse Jacobian a
//! gradient-based optimizer consumes.
//! [`check_partials`] compares that Jacobian against central differences.

pub mod check;
pub mod evaluate;

pub use check::{BlockCheck, Report, check_partials};
pub use evaluate::{Block, Evaluator, Layout, SparseJacobian, SparsityPattern};

//! The analytic-derivative component contract.
//!
//! A [`Component`] is the atomic unit of computation in a Sortie analysis.
//! It is configured once for a fixed number of nodes, after which it is
//! evaluated many times (typically once per optimizer iteration) and reports
//! both its outputs and the exact sparse Jacobian of those outputs.
//!
//! The lifecycle is enforced by construction: a component value only exists
//! once [`Component::configure`] has succeeded, and its [`Declaration`] cannot
//! change afterwards.
//!
//! Partial derivatives come from two places:
//!
//! - Entries declared constant (see [`DeclarationBuilder::constant_partial`])
//!   carry their values in the declaration and are never recomputed.
//! - Every other declared entry is returned by [`Component::jacobian`].
//!
//! Evaluation is purely functional.
//! Neither `evaluate` nor `jacobian` may depend on a previous call, so the two
//! can be called in any order and from separate clones on separate threads.

mod declaration;
mod error;
mod jacobian;
mod values;

pub use declaration::{Declaration, DeclarationBuilder, PartialDecl, VariableDecl};
pub use error::{ConfigurationError, DomainError, EvaluationError, Role};
pub use jacobian::Jacobian;
pub use values::Values;

use crate::{store::ConfigurationStore, variable::VariableRegistry};

/// A vectorized computation with analytic partial derivatives.
pub trait Component {
    /// Configures the component for `node_count` nodes.
    ///
    /// Fixed options are read from `options` (falling back to registry
    /// defaults where the component allows it) and captured for the lifetime
    /// of the component.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if `node_count` is zero, a declared
    /// variable is not in `registry`, the Jacobian pattern does not fit the
    /// declared shapes, or a required option is missing or invalid.
    fn configure(
        node_count: usize,
        registry: &VariableRegistry,
        options: &ConfigurationStore,
    ) -> Result<Self, ConfigurationError>
    where
        Self: Sized;

    /// Returns the declared inputs, outputs, and Jacobian pattern.
    fn declaration(&self) -> &Declaration;

    /// Computes every declared output from `inputs`.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluationError`] if an input is missing, has the wrong
    /// length, or is physically invalid for the component's formulas.
    fn evaluate(&self, inputs: &Values) -> Result<Values, EvaluationError>;

    /// Computes every declared partial that is not constant.
    ///
    /// The default implementation returns no entries, which is correct for
    /// components whose whole Jacobian is declared constant.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluationError`] under the same conditions as [`Component::evaluate`].
    fn jacobian(&self, inputs: &Values) -> Result<Jacobian, EvaluationError> {
        let _ = inputs;
        Ok(Jacobian::new())
    }
}

//! Core building blocks for Sortie, an aircraft mission analysis toolkit.
//!
//! This crate defines the pieces every analysis component relies on:
//!
//! - [`units`]: the [`Unit`] conversion table and unit-tagged values.
//! - [`variable`]: the enumerated [`Variable`] registry and its metadata.
//! - [`store`]: the [`ConfigurationStore`] of fixed options and design scalars.
//! - [`component`]: the analytic-derivative [`Component`] contract.
//! - [`nodes`]: the node-vectorized evaluation contract.
//! - [`constraint`]: domain checks that turn invalid physics inputs into errors.

pub mod component;
pub mod constraint;
pub mod nodes;
pub mod store;
pub mod units;
pub mod variable;

pub use component::{
    Component, ConfigurationError, Declaration, DomainError, EvaluationError, Jacobian,
    PartialDecl, Values, VariableDecl,
};
pub use nodes::{NodeCount, Shape, ShapeKind, Structure};
pub use store::{ConfigurationStore, StoreError};
pub use units::{Dimension, Magnitude, TaggedBounds, TaggedValue, Unit, UnitMismatchError};
pub use variable::{Variable, VariableMeta, VariableRegistry};

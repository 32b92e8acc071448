//! Analytic-derivative mission components for Sortie.
//!
//! Each component implements [`sortie_core::Component`] and declares its full
//! Jacobian pattern at configuration time.

pub mod mass;
pub mod taxi;

pub use mass::CargoMass;
pub use taxi::TaxiFuel;

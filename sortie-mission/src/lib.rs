//! Phase configuration and design-scalar parameterization for Sortie missions.
//!
//! A [`MissionConfig`] is the ordered set of trajectory phases an optimizer
//! flies, bracketed by pre- and post-mission settings.
//! Its phase boundaries must agree with each other: where one phase ends,
//! the next begins.
//! The [`Parameterizer`] keeps them agreeing when the design cruise altitude,
//! cruise Mach, or range changes, and [`MissionConfig::continuity_violations`]
//! reports where they do not.

mod baseline;
pub mod continuity;
mod design;
mod mission;
pub mod option;
mod parameterize;
mod phase;

pub use baseline::height_energy;
pub use continuity::{BoundaryQuantity, ContinuityViolation};
pub use design::{DesignError, DesignScalars};
pub use mission::{MissionConfig, MissionError, PostMissionOption, PreMissionOption};
pub use option::{OptionKey, OptionMap, OptionValue};
pub use parameterize::{
    BoundsPolicy, InconsistencyWarning, ParameterizeError, Parameterized, Parameterizer,
    PhaseRoles, parameterize,
};
pub use phase::{GuessKey, Phase, PhaseOption, SubsystemOptions};

/// Relative tolerance for treating two boundary values as the same.
const RELATIVE_TOLERANCE: f64 = 1e-12;

/// Returns `true` if `a` and `b` agree to within [`RELATIVE_TOLERANCE`].
pub(crate) fn nearly_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs())
}

//! Boundary continuity between consecutive phases.
//!
//! Two consecutive phases are continuous when
//!
//! - the initial time bounds of the second equal the final time bounds of the
//!   first (its initial bounds plus its duration bounds), and
//! - the final altitude and Mach of the first equal the initial altitude and
//!   Mach of the second, unless either phase optimizes that quantity.
//!
//! Options a phase does not set are not checked.

use std::fmt;

use sortie_core::{TaggedBounds, TaggedValue, UnitMismatchError};

use crate::{
    MissionConfig, nearly_equal,
    phase::{Phase, PhaseOption},
};

/// A point quantity that must match across a phase boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryQuantity {
    Altitude,
    Mach,
}

impl BoundaryQuantity {
    fn options(self) -> (PhaseOption, PhaseOption, PhaseOption) {
        match self {
            Self::Altitude => (
                PhaseOption::FinalAltitude,
                PhaseOption::InitialAltitude,
                PhaseOption::OptimizeAltitude,
            ),
            Self::Mach => (
                PhaseOption::FinalMach,
                PhaseOption::InitialMach,
                PhaseOption::OptimizeMach,
            ),
        }
    }
}

impl fmt::Display for BoundaryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Altitude => "altitude",
            Self::Mach => "Mach",
        })
    }
}

/// A break in continuity between phase `from` and the phase `to` that follows it.
#[derive(Debug, Clone, PartialEq)]
pub enum ContinuityViolation {
    /// A fixed boundary value differs across the boundary.
    Value {
        quantity: BoundaryQuantity,
        from: String,
        to: String,
        end: TaggedValue,
        start: TaggedValue,
    },

    /// The next phase does not start where this phase's time bounds end.
    Time {
        from: String,
        to: String,
        end: TaggedBounds,
        start: TaggedBounds,
    },

    /// Two values that should match cannot be compared.
    Unit {
        from: String,
        to: String,
        source: UnitMismatchError,
    },
}

impl fmt::Display for ContinuityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value {
                quantity,
                from,
                to,
                end,
                start,
            } => write!(
                f,
                "{quantity} ends `{from}` at {:?} {} but starts `{to}` at {:?} {}",
                end.magnitude(),
                end.unit(),
                start.magnitude(),
                start.unit()
            ),
            Self::Time {
                from,
                to,
                end,
                start,
            } => write!(
                f,
                "`{from}` ends within [{}, {}] {} but `{to}` starts within [{}, {}] {}",
                end.lower(),
                end.upper(),
                end.unit(),
                start.lower(),
                start.upper(),
                start.unit()
            ),
            Self::Unit { from, to, source } => {
                write!(f, "cannot compare `{from}` with `{to}`: {source}")
            }
        }
    }
}

impl MissionConfig {
    /// Returns every continuity violation between consecutive phases.
    #[must_use]
    pub fn continuity_violations(&self) -> Vec<ContinuityViolation> {
        let mut violations = Vec::new();
        for pair in self.phases().windows(2) {
            let [prev, next] = pair else { continue };
            for quantity in [BoundaryQuantity::Altitude, BoundaryQuantity::Mach] {
                violations.extend(check_value(quantity, prev, next));
            }
            violations.extend(check_time(prev, next));
        }
        violations
    }

    /// Returns `true` if there are no continuity violations.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.continuity_violations().is_empty()
    }
}

fn check_value(
    quantity: BoundaryQuantity,
    prev: &Phase,
    next: &Phase,
) -> Option<ContinuityViolation> {
    let (final_key, initial_key, optimize_key) = quantity.options();
    if prev.user_options.flag(&optimize_key) || next.user_options.flag(&optimize_key) {
        return None;
    }
    let end = prev.user_options.quantity(&final_key)?;
    let start = next.user_options.quantity(&initial_key)?;

    let same = start.convert_to(end.unit()).map(|start| {
        match (end.as_scalar(), start.as_scalar()) {
            (Some(a), Some(b)) => nearly_equal(a, b),
            _ => end.magnitude() == start.magnitude(),
        }
    });

    match same {
        Ok(true) => None,
        Ok(false) => Some(ContinuityViolation::Value {
            quantity,
            from: prev.name().to_owned(),
            to: next.name().to_owned(),
            end: end.clone(),
            start: start.clone(),
        }),
        Err(source) => Some(unit_violation(prev, next, source)),
    }
}

fn check_time(prev: &Phase, next: &Phase) -> Option<ContinuityViolation> {
    let initial = prev.user_options.bounds(&PhaseOption::InitialBounds)?;
    let duration = prev.user_options.bounds(&PhaseOption::DurationBounds)?;
    let start = next.user_options.bounds(&PhaseOption::InitialBounds)?;

    let result = initial.checked_add(duration).and_then(|end| {
        let converted = start.convert_to(end.unit())?;
        let same = nearly_equal(end.lower(), converted.lower())
            && nearly_equal(end.upper(), converted.upper());
        Ok((end, same))
    });

    match result {
        Ok((_, true)) => None,
        Ok((end, false)) => Some(ContinuityViolation::Time {
            from: prev.name().to_owned(),
            to: next.name().to_owned(),
            end,
            start: *start,
        }),
        Err(source) => Some(unit_violation(prev, next, source)),
    }
}

fn unit_violation(prev: &Phase, next: &Phase, source: UnitMismatchError) -> ContinuityViolation {
    ContinuityViolation::Unit {
        from: prev.name().to_owned(),
        to: next.name().to_owned(),
        source,
    }
}

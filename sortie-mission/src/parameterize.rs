//! Propagates changed design scalars through a mission's phase boundaries.
//!
//! The cruise phase's initial altitude and Mach, and the post-mission target
//! range, are the values a mission was built around.
//! When a [`DesignScalars`] value disagrees with them, the [`Parameterizer`]
//! rewrites every boundary slot that must stay equal to keep the mission
//! continuous:
//!
//! | changed scalar  | rewritten slots |
//! |-----------------|-----------------|
//! | cruise altitude | climb `final_altitude`, cruise `initial_altitude` and `final_altitude`, descent `initial_altitude` |
//! | cruise Mach     | climb `final_mach`, cruise `initial_mach` and `final_mach`, descent `initial_mach` |
//! | design range    | post-mission `target_range`, scaled by new over old |
//!
//! Bounds are never rewritten.
//! A rewritten value that falls outside its phase's bounds is handled by the
//! selected [`BoundsPolicy`].

use serde::{Deserialize, Serialize};
use sortie_core::{TaggedBounds, TaggedValue, Unit, UnitMismatchError, units::ValueError};
use thiserror::Error;

use crate::{
    design::DesignScalars,
    mission::{MissionConfig, PostMissionOption},
    nearly_equal,
    option::{OptionKey, OptionValue},
    phase::{Phase, PhaseOption},
};

const POST_MISSION: &str = "post_mission";

/// What to do when a rewritten value lies outside its phase's bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Keep the value and say nothing.
    Permit,
    /// Keep the value, log it, and report it in [`Parameterized::warnings`].
    #[default]
    Warn,
    /// Fail with [`ParameterizeError::OutOfBounds`].
    Reject,
}

/// The names of the phases that play the climb, cruise, and descent roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseRoles {
    pub climb: String,
    pub cruise: String,
    pub descent: String,
}

impl Default for PhaseRoles {
    fn default() -> Self {
        Self {
            climb: "climb".into(),
            cruise: "cruise".into(),
            descent: "descent".into(),
        }
    }
}

/// A rewritten boundary value that lies outside its phase's bounds.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "`{option}` of phase `{phase}` is {:?} {} but its bounds are [{}, {}] {}",
    .value.magnitude(), .value.unit(), .bounds.lower(), .bounds.upper(), .bounds.unit()
)]
pub struct InconsistencyWarning {
    pub phase: String,
    pub option: PhaseOption,
    pub value: TaggedValue,
    pub bounds: TaggedBounds,
}

/// Errors that can occur during parameterization.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParameterizeError {
    #[error("no `{name}` phase for the {role} role")]
    MissingPhase { role: &'static str, name: String },

    #[error("`{section}` has no `{option}`")]
    MissingOption { section: String, option: String },

    #[error("`{option}` in `{section}` is invalid: {reason}")]
    InvalidOption {
        section: String,
        option: String,
        reason: &'static str,
    },

    #[error("`{option}` in `{section}` has an incompatible unit")]
    Unit {
        section: String,
        option: String,
        #[source]
        source: UnitMismatchError,
    },

    #[error("{} rewritten values lie outside their bounds", .warnings.len())]
    OutOfBounds { warnings: Vec<InconsistencyWarning> },
}

/// A parameterized mission and the bounds warnings raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameterized {
    pub mission: MissionConfig,
    pub warnings: Vec<InconsistencyWarning>,
}

/// Rewrites a mission's phase boundaries to match new design scalars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameterizer {
    pub roles: PhaseRoles,
    pub policy: BoundsPolicy,
}

impl Parameterizer {
    /// Creates a parameterizer with the default roles and the warn policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BoundsPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: PhaseRoles) -> Self {
        self.roles = roles;
        self
    }

    /// Returns a copy of `mission` updated to match `design`.
    ///
    /// Post-mission settings live in [`MissionConfig::post_mission`], so the
    /// updated target range comes back inside [`Parameterized::mission`]
    /// alongside the phases.
    /// The baseline is never modified.
    /// When every design scalar already matches, the returned mission equals
    /// the baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if a role's phase or a compared option is missing,
    /// units cannot be reconciled, or a value is out of bounds under
    /// [`BoundsPolicy::Reject`].
    pub fn parameterize(
        &self,
        mission: &MissionConfig,
        design: &DesignScalars,
    ) -> Result<Parameterized, ParameterizeError> {
        let mut updated = mission.clone();
        let mut warnings = Vec::new();

        for (role, name) in [
            ("climb", &self.roles.climb),
            ("cruise", &self.roles.cruise),
            ("descent", &self.roles.descent),
        ] {
            if mission.phase(name).is_none() {
                return Err(ParameterizeError::MissingPhase {
                    role,
                    name: name.clone(),
                });
            }
        }

        if let Some(target) = self.rescaled_range(mission, design)? {
            log::debug!(
                "design range changed, target range is now {:?} {}",
                target.magnitude(),
                target.unit()
            );
            updated
                .post_mission
                .insert(PostMissionOption::TargetRange, target.into());
        }

        for slots in [Slots::ALTITUDE, Slots::MACH] {
            let Some(value) = self.changed_point(mission, &slots, design)? else {
                continue;
            };
            log::debug!(
                "cruise {} changed to {:?} {}",
                slots.quantity,
                value.magnitude(),
                value.unit()
            );
            for (role, name, option) in slots.rewritten(&self.roles) {
                let phase = updated
                    .phase_mut(name)
                    .ok_or_else(|| ParameterizeError::MissingPhase {
                        role,
                        name: name.to_owned(),
                    })?;
                phase.user_options.insert(option.clone(), value.clone().into());
                warnings.extend(out_of_bounds(phase, &option, &slots.bounds, &value)?);
            }
        }

        if let Some(gross_mass) = design.gross_mass() {
            log::debug!(
                "design gross mass {:?} {} does not change phase boundaries",
                gross_mass.magnitude(),
                gross_mass.unit()
            );
        }

        match self.policy {
            BoundsPolicy::Permit => warnings.clear(),
            BoundsPolicy::Warn => {
                for warning in &warnings {
                    log::warn!("{warning}");
                }
            }
            BoundsPolicy::Reject if !warnings.is_empty() => {
                return Err(ParameterizeError::OutOfBounds { warnings });
            }
            BoundsPolicy::Reject => {}
        }

        Ok(Parameterized {
            mission: updated,
            warnings,
        })
    }

    /// Returns the new target range, or `None` if the design range is unchanged.
    fn rescaled_range(
        &self,
        mission: &MissionConfig,
        design: &DesignScalars,
    ) -> Result<Option<TaggedValue>, ParameterizeError> {
        let key = PostMissionOption::TargetRange;
        let (old, unit) = scalar_option(POST_MISSION, &key, mission.post_mission.get(&key))?;
        let new = design
            .range()
            .scalar_in(unit)
            .map_err(|source| unit_error(POST_MISSION, &key, source))?;

        // The baked-in range is the target itself, so scaling it by new/old is the new range.
        Ok((!nearly_equal(old, new)).then(|| TaggedValue::scalar(new, unit)))
    }

    /// Returns the design value in the cruise slot's unit, or `None` if it is unchanged.
    fn changed_point(
        &self,
        mission: &MissionConfig,
        slots: &Slots,
        design: &DesignScalars,
    ) -> Result<Option<TaggedValue>, ParameterizeError> {
        let cruise = &self.roles.cruise;
        let baked = mission
            .phase(cruise)
            .and_then(|phase| phase.user_options.get(&slots.cruise_initial));
        let (old, unit) = scalar_option(cruise, &slots.cruise_initial, baked)?;

        let new = (slots.design)(design)
            .scalar_in(unit)
            .map_err(|source| unit_error(cruise, &slots.cruise_initial, source))?;

        Ok((!nearly_equal(old, new)).then(|| TaggedValue::scalar(new, unit)))
    }
}

/// Parameterizes `mission` with the default roles and the warn policy.
///
/// The mission literal carries its own post-mission section, so one
/// [`MissionConfig`] goes in and one comes out rather than a separate
/// `(mission, post_mission)` pair.
///
/// # Errors
///
/// See [`Parameterizer::parameterize`].
pub fn parameterize(
    mission: &MissionConfig,
    design: &DesignScalars,
) -> Result<Parameterized, ParameterizeError> {
    Parameterizer::new().parameterize(mission, design)
}

/// The boundary slots tied to one design point quantity.
struct Slots {
    quantity: &'static str,
    initial: PhaseOption,
    last: PhaseOption,
    bounds: PhaseOption,
    cruise_initial: PhaseOption,
    design: fn(&DesignScalars) -> &TaggedValue,
}

impl Slots {
    const ALTITUDE: Self = Self {
        quantity: "altitude",
        initial: PhaseOption::InitialAltitude,
        last: PhaseOption::FinalAltitude,
        bounds: PhaseOption::AltitudeBounds,
        cruise_initial: PhaseOption::InitialAltitude,
        design: DesignScalars::cruise_altitude,
    };

    const MACH: Self = Self {
        quantity: "Mach",
        initial: PhaseOption::InitialMach,
        last: PhaseOption::FinalMach,
        bounds: PhaseOption::MachBounds,
        cruise_initial: PhaseOption::InitialMach,
        design: DesignScalars::cruise_mach,
    };

    /// Returns the four slots that must equal the cruise design point, in flight order.
    fn rewritten<'a>(&self, roles: &'a PhaseRoles) -> [(&'static str, &'a str, PhaseOption); 4] {
        [
            ("climb", &roles.climb, self.last.clone()),
            ("cruise", &roles.cruise, self.initial.clone()),
            ("cruise", &roles.cruise, self.last.clone()),
            ("descent", &roles.descent, self.initial.clone()),
        ]
    }
}

/// Reads a scalar quantity option as its value and unit.
fn scalar_option<K: OptionKey>(
    section: &str,
    key: &K,
    value: Option<&OptionValue>,
) -> Result<(f64, Unit), ParameterizeError> {
    let Some(value) = value else {
        return Err(ParameterizeError::MissingOption {
            section: section.to_owned(),
            option: key.as_str().to_owned(),
        });
    };
    let invalid = |reason| ParameterizeError::InvalidOption {
        section: section.to_owned(),
        option: key.as_str().to_owned(),
        reason,
    };
    let quantity = value
        .as_quantity()
        .ok_or_else(|| invalid("expected a unit-tagged quantity"))?;
    let scalar = quantity
        .as_scalar()
        .ok_or_else(|| invalid("expected a scalar"))?;
    if !scalar.is_finite() {
        return Err(invalid("expected a finite value"));
    }
    Ok((scalar, quantity.unit()))
}

fn unit_error<K: OptionKey>(section: &str, key: &K, source: ValueError) -> ParameterizeError {
    match source {
        ValueError::Unit(source) => ParameterizeError::Unit {
            section: section.to_owned(),
            option: key.as_str().to_owned(),
            source,
        },
        ValueError::NotScalar { .. } => ParameterizeError::InvalidOption {
            section: section.to_owned(),
            option: key.as_str().to_owned(),
            reason: "expected a scalar",
        },
    }
}

/// Checks a rewritten value against the phase's own bounds, if it has any.
fn out_of_bounds(
    phase: &Phase,
    option: &PhaseOption,
    bounds_key: &PhaseOption,
    value: &TaggedValue,
) -> Result<Option<InconsistencyWarning>, ParameterizeError> {
    let Some(bounds) = phase.user_options.bounds(bounds_key) else {
        return Ok(None);
    };
    let inside = bounds
        .contains(value)
        .map_err(|source| unit_error(phase.name(), bounds_key, source))?;
    Ok((!inside).then(|| InconsistencyWarning {
        phase: phase.name().to_owned(),
        option: option.clone(),
        value: value.clone(),
        bounds: *bounds,
    }))
}

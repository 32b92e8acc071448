//! The baseline height-energy mission.

use sortie_core::{TaggedValue, Unit};

use crate::{
    mission::{MissionConfig, PostMissionOption, PreMissionOption},
    option::{OptionMap, OptionValue},
    phase::{GuessKey, Phase, PhaseOption},
};

/// Boundary values that differ between the three baseline phases.
struct Profile<'a> {
    name: &'a str,
    mach: (f64, f64),
    mach_bounds: (f64, f64),
    altitude: (f64, f64),
    altitude_bounds: (f64, f64),
    throttle_enforcement: &'a str,
    fix_initial: bool,
    constrain_final: bool,
    initial_bounds: (f64, f64),
    duration_bounds: (f64, f64),
    times: [f64; 2],
}

impl Profile<'_> {
    fn into_phase(self) -> Phase {
        use PhaseOption as O;

        let ft = |v| OptionValue::quantity(v, Unit::Foot);
        let mach = |v| OptionValue::quantity(v, Unit::Unitless);
        let minutes = |(lo, hi): (f64, f64)| OptionValue::bounds(lo, hi, Unit::Minute);

        Phase::new(self.name)
            .with_subsystem("core_aerodynamics", "method", "computed")
            .with_option(O::OptimizeMach, false)
            .with_option(O::OptimizeAltitude, false)
            .with_option(O::NumSegments, 5_i64)
            .with_option(O::Order, 3_i64)
            .with_option(O::SolveForDistance, false)
            .with_option(O::InitialMach, mach(self.mach.0))
            .with_option(O::FinalMach, mach(self.mach.1))
            .with_option(
                O::MachBounds,
                OptionValue::bounds(self.mach_bounds.0, self.mach_bounds.1, Unit::Unitless),
            )
            .with_option(O::InitialAltitude, ft(self.altitude.0))
            .with_option(O::FinalAltitude, ft(self.altitude.1))
            .with_option(
                O::AltitudeBounds,
                OptionValue::bounds(self.altitude_bounds.0, self.altitude_bounds.1, Unit::Foot),
            )
            .with_option(O::ThrottleEnforcement, self.throttle_enforcement)
            .with_option(O::FixInitial, self.fix_initial)
            .with_option(O::ConstrainFinal, self.constrain_final)
            .with_option(O::FixDuration, false)
            .with_option(O::InitialBounds, minutes(self.initial_bounds))
            .with_option(O::DurationBounds, minutes(self.duration_bounds))
            .with_guess(
                GuessKey::Times,
                TaggedValue::array(self.times.to_vec(), Unit::Minute),
            )
    }
}

/// Returns the baseline three-phase height-energy mission.
///
/// The mission climbs from sea level to 32000 ft at Mach 0.72, cruises up
/// to 34000 ft, and descends to 500 ft at Mach 0.36 over a 1906 nmi target
/// range.
/// Its phase boundaries are continuous.
#[must_use]
pub fn height_energy() -> MissionConfig {
    let climb = Profile {
        name: "climb",
        mach: (0.2, 0.72),
        mach_bounds: (0.18, 0.74),
        altitude: (0.0, 32_000.0),
        altitude_bounds: (0.0, 34_000.0),
        throttle_enforcement: "path_constraint",
        fix_initial: true,
        constrain_final: false,
        initial_bounds: (0.0, 0.0),
        duration_bounds: (64.0, 192.0),
        times: [0.0, 128.0],
    }
    .into_phase()
    .with_option(PhaseOption::AddInitialMassConstraint, false);

    let cruise = Profile {
        name: "cruise",
        mach: (0.72, 0.72),
        mach_bounds: (0.7, 0.74),
        altitude: (32_000.0, 34_000.0),
        altitude_bounds: (23_000.0, 38_000.0),
        throttle_enforcement: "boundary_constraint",
        fix_initial: false,
        constrain_final: false,
        initial_bounds: (64.0, 192.0),
        duration_bounds: (56.5, 169.5),
        times: [128.0, 113.0],
    }
    .into_phase();

    let descent = Profile {
        name: "descent",
        mach: (0.72, 0.36),
        mach_bounds: (0.34, 0.74),
        altitude: (34_000.0, 500.0),
        altitude_bounds: (0.0, 38_000.0),
        throttle_enforcement: "path_constraint",
        fix_initial: false,
        constrain_final: true,
        initial_bounds: (120.5, 361.5),
        duration_bounds: (29.0, 87.0),
        times: [241.0, 58.0],
    }
    .into_phase();

    MissionConfig::from_parts(
        OptionMap::new()
            .with(PreMissionOption::IncludeTakeoff, false)
            .with(PreMissionOption::OptimizeMass, true),
        vec![climb, cruise, descent],
        OptionMap::new()
            .with(PostMissionOption::IncludeLanding, false)
            .with(PostMissionOption::ConstrainRange, true)
            .with(
                PostMissionOption::TargetRange,
                OptionValue::quantity(1906.0, Unit::NauticalMile),
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::option::OptionKey;

    #[test]
    fn baseline_is_continuous() {
        let mission = height_energy();
        assert_eq!(
            mission.phase_names().collect::<Vec<_>>(),
            ["climb", "cruise", "descent"]
        );
        assert!(mission.is_continuous(), "{:?}", mission.continuity_violations());
    }

    #[test]
    fn climb_carries_the_initial_mass_flag_last() {
        let mission = height_energy();
        let climb = mission.phase("climb").unwrap();
        let last = climb.user_options.keys().last().map(OptionKey::as_str);
        assert_eq!(last, Some("add_initial_mass_constraint"));
        assert!(
            !mission
                .phase("cruise")
                .unwrap()
                .user_options
                .contains(&PhaseOption::AddInitialMassConstraint)
        );
    }

    #[test]
    fn cruise_starts_at_the_design_point() {
        let mission = height_energy();
        let cruise = &mission.phase("cruise").unwrap().user_options;
        assert_eq!(
            cruise.quantity(&PhaseOption::InitialAltitude),
            Some(&TaggedValue::scalar(32_000.0, Unit::Foot))
        );
        assert_eq!(
            cruise.quantity(&PhaseOption::InitialMach),
            Some(&TaggedValue::scalar(0.72, Unit::Unitless))
        );
        assert_eq!(
            mission.post_mission.quantity(&PostMissionOption::TargetRange),
            Some(&TaggedValue::scalar(1906.0, Unit::NauticalMile))
        );
    }

    #[test]
    fn round_trips_through_json() {
        let mission = height_energy();
        let json = mission.to_json_pretty().unwrap();
        assert_eq!(MissionConfig::from_json(&json).unwrap(), mission);
    }
}

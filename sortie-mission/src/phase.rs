use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::Value;
use sortie_core::TaggedValue;

use crate::option::{OptionKey, OptionMap, OptionValue, option_keys};

option_keys!(
    /// A key in a phase's `user_options`.
    pub enum PhaseOption {
        OptimizeMach => "optimize_mach",
        OptimizeAltitude => "optimize_altitude",
        NumSegments => "num_segments",
        Order => "order",
        SolveForDistance => "solve_for_distance",
        InitialMach => "initial_mach",
        FinalMach => "final_mach",
        MachBounds => "mach_bounds",
        InitialAltitude => "initial_altitude",
        FinalAltitude => "final_altitude",
        AltitudeBounds => "altitude_bounds",
        ThrottleEnforcement => "throttle_enforcement",
        FixInitial => "fix_initial",
        ConstrainFinal => "constrain_final",
        FixDuration => "fix_duration",
        InitialBounds => "initial_bounds",
        DurationBounds => "duration_bounds",
        AddInitialMassConstraint => "add_initial_mass_constraint",
    }
);

option_keys!(
    /// A key in a phase's `initial_guesses`.
    pub enum GuessKey {
        Times => "times",
        Altitude => "altitude",
        Mach => "mach",
        Mass => "mass",
        Distance => "distance",
        Throttle => "throttle",
    }
);

option_keys!(
    /// A top-level key of a phase.
    pub enum PhaseSection {
        SubsystemOptions => "subsystem_options",
        UserOptions => "user_options",
        InitialGuesses => "initial_guesses",
    }
);

/// Method selections for each subsystem, keyed by subsystem name.
pub type SubsystemOptions = OptionMap<String, OptionMap<String>>;

/// One trajectory phase of a mission.
///
/// The name is the phase's key in the enclosing [`MissionConfig`](crate::MissionConfig)
/// and is not serialized with the phase itself.
/// Sections are written back in the order they were read, empty ones
/// included, with any section first set in code appended after them.
/// Phase-level keys other than the three known sections are kept in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    name: String,
    pub subsystem_options: SubsystemOptions,
    pub user_options: OptionMap<PhaseOption>,
    pub initial_guesses: OptionMap<GuessKey, TaggedValue>,
    pub extra: OptionMap<String, Value>,
    layout: Vec<PhaseSection>,
}

impl Phase {
    /// Creates an empty phase called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subsystem_options: OptionMap::new(),
            user_options: OptionMap::new(),
            initial_guesses: OptionMap::new(),
            extra: OptionMap::new(),
            layout: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Returns `self` with a user option set.
    #[must_use]
    pub fn with_option(mut self, key: PhaseOption, value: impl Into<OptionValue>) -> Self {
        self.mark(PhaseSection::UserOptions);
        self.user_options.insert(key, value.into());
        self
    }

    /// Returns `self` with an initial guess set.
    #[must_use]
    pub fn with_guess(mut self, key: GuessKey, value: TaggedValue) -> Self {
        self.mark(PhaseSection::InitialGuesses);
        self.initial_guesses.insert(key, value);
        self
    }

    /// Returns `self` with a subsystem method option set.
    #[must_use]
    pub fn with_subsystem(mut self, subsystem: &str, option: &str, value: &str) -> Self {
        self.mark(PhaseSection::SubsystemOptions);
        let subsystem = subsystem.to_owned();
        match self.subsystem_options.get_mut(&subsystem) {
            Some(options) => {
                options.insert(option.to_owned(), value.into());
            }
            None => {
                let options = OptionMap::new().with(option.to_owned(), value);
                self.subsystem_options.insert(subsystem, options);
            }
        }
        self
    }

    fn mark(&mut self, section: PhaseSection) {
        if !self.layout.contains(&section) {
            self.layout.push(section);
        }
    }

    /// Returns the sections to write, in order.
    fn sections(&self) -> Vec<PhaseSection> {
        let mut sections: Vec<PhaseSection> = self
            .layout
            .iter()
            .filter(|section| match section {
                PhaseSection::Other(key) => self.extra.contains(key),
                _ => true,
            })
            .cloned()
            .collect();

        let known = [
            PhaseSection::SubsystemOptions,
            PhaseSection::UserOptions,
            PhaseSection::InitialGuesses,
        ];
        let filled = known.into_iter().filter(|section| match section {
            PhaseSection::SubsystemOptions => !self.subsystem_options.is_empty(),
            PhaseSection::UserOptions => !self.user_options.is_empty(),
            PhaseSection::InitialGuesses => !self.initial_guesses.is_empty(),
            PhaseSection::Other(_) => false,
        });
        let extra = self.extra.keys().cloned().map(PhaseSection::Other);

        for section in filled.chain(extra) {
            if !sections.contains(&section) {
                sections.push(section);
            }
        }
        sections
    }
}

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sections = self.sections();
        let mut map = serializer.serialize_map(Some(sections.len()))?;
        for section in &sections {
            let key = section.as_str();
            match section {
                PhaseSection::SubsystemOptions => map.serialize_entry(key, &self.subsystem_options)?,
                PhaseSection::UserOptions => map.serialize_entry(key, &self.user_options)?,
                PhaseSection::InitialGuesses => map.serialize_entry(key, &self.initial_guesses)?,
                PhaseSection::Other(name) => {
                    if let Some(value) = self.extra.get(name) {
                        map.serialize_entry(key, value)?;
                    }
                }
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PhaseVisitor)
    }
}

struct PhaseVisitor;

impl<'de> Visitor<'de> for PhaseVisitor {
    type Value = Phase;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a phase mapping of option sections")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut phase = Phase::new(String::new());
        while let Some(key) = access.next_key::<String>()? {
            let section = PhaseSection::from_name(&key);
            match section {
                PhaseSection::SubsystemOptions => phase.subsystem_options = access.next_value()?,
                PhaseSection::UserOptions => phase.user_options = access.next_value()?,
                PhaseSection::InitialGuesses => phase.initial_guesses = access.next_value()?,
                PhaseSection::Other(_) => {
                    phase.extra.insert(key, access.next_value()?);
                }
            }
            phase.mark(section);
        }
        Ok(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sortie_core::Unit;

    fn round_trip(json: &str) -> String {
        let phase: Phase = serde_json::from_str(json).unwrap();
        serde_json::to_string(&phase).unwrap()
    }

    #[test]
    fn sections_keep_their_order_and_presence() {
        for json in [
            r#"{"initial_guesses":{"times":[[0.0,128.0],"min"]},"user_options":{"order":3},"subsystem_options":{}}"#,
            r#"{"external_subsystems":["battery"],"initial_guesses":{}}"#,
            r#"{"user_options":{}}"#,
            "{}",
        ] {
            assert_eq!(round_trip(json), json);
        }
    }

    #[test]
    fn sections_set_in_code_follow_the_ones_read() {
        let phase: Phase = serde_json::from_str(r#"{"initial_guesses":{}}"#).unwrap();
        let phase = phase.with_option(PhaseOption::Order, 3_i64);
        assert_eq!(
            serde_json::to_string(&phase).unwrap(),
            r#"{"initial_guesses":{},"user_options":{"order":3}}"#
        );

        let mut phase = Phase::new("cruise");
        phase.initial_guesses.insert(
            GuessKey::Times,
            TaggedValue::array(vec![128.0, 113.0], Unit::Minute),
        );
        phase.extra.insert("note".to_owned(), Value::from("hold"));
        assert_eq!(
            serde_json::to_string(&phase).unwrap(),
            r#"{"initial_guesses":{"times":[[128.0,113.0],"min"]},"note":"hold"}"#
        );
    }

    #[test]
    fn builders_record_their_sections() {
        let phase = Phase::new("climb")
            .with_subsystem("core_aerodynamics", "method", "computed")
            .with_option(PhaseOption::Order, 3_i64)
            .with_guess(GuessKey::Times, TaggedValue::array(vec![0.0, 128.0], Unit::Minute));
        let json = serde_json::to_string(&phase).unwrap();

        let mut reparsed: Phase = serde_json::from_str(&json).unwrap();
        reparsed.set_name("climb".to_owned());
        assert_eq!(reparsed, phase);
    }
}

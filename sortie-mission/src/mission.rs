use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};
use thiserror::Error;

use crate::{
    option::{OptionMap, option_keys},
    phase::Phase,
};

option_keys!(
    /// A key in the `pre_mission` section.
    pub enum PreMissionOption {
        IncludeTakeoff => "include_takeoff",
        OptimizeMass => "optimize_mass",
    }
);

option_keys!(
    /// A key in the `post_mission` section.
    pub enum PostMissionOption {
        IncludeLanding => "include_landing",
        ConstrainRange => "constrain_range",
        TargetRange => "target_range",
    }
);

const PRE_MISSION: &str = "pre_mission";
const POST_MISSION: &str = "post_mission";

/// Errors that can occur when assembling a [`MissionConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissionError {
    #[error("phase `{name}` appears more than once")]
    DuplicatePhase { name: String },

    #[error("`{name}` is reserved and cannot name a phase")]
    ReservedName { name: String },
}

/// A complete mission: pre-mission settings, ordered phases, and post-mission settings.
///
/// Serialized as a single mapping with `pre_mission` first, one key per
/// phase in flight order, and `post_mission` last:
///
/// ```
/// use sortie_mission::MissionConfig;
///
/// let mission = MissionConfig::from_json(r#"{
///     "pre_mission": {"include_takeoff": false},
///     "climb": {"user_options": {"final_altitude": [32000.0, "ft"]}},
///     "post_mission": {"target_range": [1906.0, "nmi"]}
/// }"#).unwrap();
///
/// assert_eq!(mission.phase_names().collect::<Vec<_>>(), ["climb"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionConfig {
    pub pre_mission: OptionMap<PreMissionOption>,
    phases: Vec<Phase>,
    pub post_mission: OptionMap<PostMissionOption>,
}

impl MissionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a mission from phases whose names are known to be distinct
    /// and unreserved.
    pub(crate) fn from_parts(
        pre_mission: OptionMap<PreMissionOption>,
        phases: Vec<Phase>,
        post_mission: OptionMap<PostMissionOption>,
    ) -> Self {
        debug_assert!(
            phases
                .iter()
                .enumerate()
                .all(|(i, p)| phases[..i].iter().all(|q| q.name() != p.name()))
        );
        Self {
            pre_mission,
            phases,
            post_mission,
        }
    }

    /// Parses a mission literal.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid mission literal.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Writes the mission literal, preserving key order.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Appends a phase after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already used or is reserved.
    pub fn push_phase(&mut self, phase: Phase) -> Result<(), MissionError> {
        let name = phase.name();
        if name == PRE_MISSION || name == POST_MISSION {
            return Err(MissionError::ReservedName {
                name: name.to_owned(),
            });
        }
        if self.phase(name).is_some() {
            return Err(MissionError::DuplicatePhase {
                name: name.to_owned(),
            });
        }
        self.phases.push(phase);
        Ok(())
    }

    /// Returns the phases in flight order.
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase_names(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(Phase::name)
    }

    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name() == name)
    }

    pub fn phase_mut(&mut self, name: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.name() == name)
    }
}

impl Serialize for MissionConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.phases.len() + 2))?;
        map.serialize_entry(PRE_MISSION, &self.pre_mission)?;
        for phase in &self.phases {
            map.serialize_entry(phase.name(), phase)?;
        }
        map.serialize_entry(POST_MISSION, &self.post_mission)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for MissionConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MissionVisitor)
    }
}

struct MissionVisitor;

impl<'de> Visitor<'de> for MissionVisitor {
    type Value = MissionConfig;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a mission mapping of pre_mission, phases, and post_mission")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut mission = MissionConfig::new();
        while let Some(key) = access.next_key::<String>()? {
            match key.as_str() {
                PRE_MISSION => mission.pre_mission = access.next_value()?,
                POST_MISSION => mission.post_mission = access.next_value()?,
                _ => {
                    let mut phase: Phase = access.next_value()?;
                    phase.set_name(key);
                    mission.push_phase(phase).map_err(de::Error::custom)?;
                }
            }
        }
        Ok(mission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sortie_core::{TaggedValue, Unit};

    use crate::phase::PhaseOption;

    #[test]
    fn phases_keep_their_order_and_names() {
        let mission = MissionConfig::from_json(
            r#"{
                "descent": {},
                "pre_mission": {"optimize_mass": true},
                "climb": {"user_options": {"order": 3}}
            }"#,
        )
        .unwrap();

        assert_eq!(mission.phase_names().collect::<Vec<_>>(), ["descent", "climb"]);
        assert!(mission.pre_mission.flag(&PreMissionOption::OptimizeMass));
        assert!(mission.post_mission.is_empty());
    }

    #[test]
    fn duplicate_phases_are_rejected() {
        let mut mission = MissionConfig::new();
        mission.push_phase(Phase::new("cruise")).unwrap();
        assert_eq!(
            mission.push_phase(Phase::new("cruise")),
            Err(MissionError::DuplicatePhase {
                name: "cruise".into()
            })
        );
        assert!(matches!(
            mission.push_phase(Phase::new("post_mission")),
            Err(MissionError::ReservedName { .. })
        ));
    }

    #[test]
    fn serializes_sections_around_the_phases() {
        let mut mission = MissionConfig::new();
        mission
            .push_phase(Phase::new("cruise").with_option(
                PhaseOption::InitialAltitude,
                TaggedValue::scalar(32_000.0, Unit::Foot),
            ))
            .unwrap();
        mission.post_mission.insert(
            PostMissionOption::TargetRange,
            TaggedValue::scalar(1906.0, Unit::NauticalMile).into(),
        );

        let json = serde_json::to_string(&mission).unwrap();
        assert_eq!(
            json,
            r#"{"pre_mission":{},"cruise":{"user_options":{"initial_altitude":[32000.0,"ft"]}},"post_mission":{"target_range":[1906.0,"nmi"]}}"#
        );
        assert_eq!(MissionConfig::from_json(&json).unwrap(), mission);
    }

    #[test]
    fn phase_sections_keep_their_written_order() {
        let json = r#"{"pre_mission":{},"climb":{"initial_guesses":{"times":[[0.0,128.0],"min"]},"user_options":{"order":3},"subsystem_options":{}},"descent":{},"post_mission":{}}"#;
        let mission = MissionConfig::from_json(json).unwrap();
        assert_eq!(serde_json::to_string(&mission).unwrap(), json);
    }

    #[test]
    fn unknown_phase_keys_survive() {
        let json = r#"{"pre_mission":{},"hold":{"user_options":{},"external_subsystems":["battery"]},"post_mission":{}}"#;
        let mission = MissionConfig::from_json(json).unwrap();
        assert_eq!(serde_json::to_string(&mission).unwrap(), json);
    }
}

//! Shared fixtures for Sortie's cross-crate tests.

use sortie_core::ConfigurationStore;
use sortie_mission::MissionConfig;

/// The baseline height-energy mission literal.
pub const HEIGHT_ENERGY_JSON: &str = include_str!("../fixtures/height_energy.json");

/// An aircraft and design configuration for a 150-seat transport.
pub const AIRCRAFT_JSON: &str = include_str!("../fixtures/aircraft.json");

/// Parses [`HEIGHT_ENERGY_JSON`].
///
/// # Panics
///
/// Panics if the fixture is not a valid mission literal.
#[must_use]
pub fn height_energy_fixture() -> MissionConfig {
    MissionConfig::from_json(HEIGHT_ENERGY_JSON).expect("mission fixture should parse")
}

/// Parses [`AIRCRAFT_JSON`].
///
/// # Panics
///
/// Panics if the fixture is not a valid configuration store.
#[must_use]
pub fn aircraft_fixture() -> ConfigurationStore {
    serde_json::from_str(AIRCRAFT_JSON).expect("aircraft fixture should parse")
}

/// Returns the keys of a JSON object in document order.
///
/// # Panics
///
/// Panics if `json` is not a JSON object.
#[must_use]
pub fn object_keys(json: &str) -> Vec<String> {
    let value: serde_json::Value = serde_json::from_str(json).expect("valid JSON");
    value
        .as_object()
        .expect("a JSON object")
        .keys()
        .cloned()
        .collect()
}

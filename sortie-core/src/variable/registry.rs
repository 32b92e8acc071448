use std::collections::BTreeMap;

use crate::{
    nodes::{NodeCount, ShapeKind, broadcast},
    units::{TaggedValue, Unit},
};

use super::Variable;

/// Metadata describing a registered variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableMeta {
    pub variable: Variable,
    /// The unit component values for this variable are exchanged in.
    pub unit: Unit,
    /// Default value, in `unit`, broadcast over every node for per-node variables.
    pub default: f64,
    pub shape: ShapeKind,
    pub description: &'static str,
}

impl VariableMeta {
    #[must_use]
    pub const fn new(
        variable: Variable,
        unit: Unit,
        default: f64,
        shape: ShapeKind,
        description: &'static str,
    ) -> Self {
        Self {
            variable,
            unit,
            default,
            shape,
            description,
        }
    }

    /// Returns the default as a tagged value shaped for `nodes`.
    #[must_use]
    pub fn default_value(&self, nodes: NodeCount) -> TaggedValue {
        match self.shape {
            ShapeKind::Scalar => TaggedValue::scalar(self.default, self.unit),
            ShapeKind::PerNode => TaggedValue::array(
                broadcast(self.default, self.shape.resolve(nodes)).to_vec(),
                self.unit,
            ),
        }
    }
}

/// Maps each known [`Variable`] to its metadata.
///
/// Components look up every variable they declare here and never redefine
/// units or shapes themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableRegistry {
    entries: BTreeMap<Variable, VariableMeta>,
}

impl VariableRegistry {
    /// Creates a registry with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the registry of every variable Sortie ships metadata for.
    #[must_use]
    pub fn standard() -> Self {
        use ShapeKind::{PerNode, Scalar};
        use Unit::{Foot, Hour, NauticalMile, PoundMass, PoundMassPerSecond, Unitless};
        use Variable as V;

        let entries = [
            VariableMeta::new(V::NumPassengers, Unitless, 0.0, Scalar, "total number of passengers"),
            VariableMeta::new(V::MassPerPassenger, PoundMass, 165.0, Scalar, "mass of one passenger"),
            VariableMeta::new(
                V::BaggageMassPerPassenger,
                PoundMass,
                0.0,
                Scalar,
                "baggage mass per passenger",
            ),
            VariableMeta::new(V::WingCargo, PoundMass, 0.0, Scalar, "cargo carried in the wing"),
            VariableMeta::new(V::MiscCargo, PoundMass, 0.0, Scalar, "miscellaneous cargo"),
            VariableMeta::new(V::PassengerMass, PoundMass, 0.0, Scalar, "mass of all passengers"),
            VariableMeta::new(V::BaggageMass, PoundMass, 0.0, Scalar, "mass of all passenger baggage"),
            VariableMeta::new(
                V::PassengerPayloadMass,
                PoundMass,
                0.0,
                Scalar,
                "passengers plus baggage",
            ),
            VariableMeta::new(V::CargoMass, PoundMass, 0.0, Scalar, "total cargo mass"),
            VariableMeta::new(V::TotalPayloadMass, PoundMass, 0.0, Scalar, "total payload mass"),
            VariableMeta::new(V::CruiseAltitude, Foot, 25_000.0, Scalar, "design cruise altitude"),
            VariableMeta::new(V::DesignRange, NauticalMile, 0.0, Scalar, "design mission range"),
            VariableMeta::new(V::DesignGrossMass, PoundMass, 0.0, Scalar, "design gross mass"),
            VariableMeta::new(V::CruiseMach, Unitless, 0.0, Scalar, "cruise Mach number"),
            VariableMeta::new(V::GrossMass, PoundMass, 175_400.0, Scalar, "gross takeoff mass"),
            VariableMeta::new(V::TaxiDuration, Hour, 0.1677, Scalar, "time spent taxiing"),
            VariableMeta::new(
                V::TaxiFuelConsumed,
                PoundMass,
                1.0,
                PerNode,
                "fuel consumed while taxiing",
            ),
            VariableMeta::new(
                V::FuelFlowRateNegativeTotal,
                PoundMassPerSecond,
                1.0,
                PerNode,
                "total fuel flow rate, negative when burning",
            ),
            VariableMeta::new(V::Mass, PoundMass, 175_000.0, PerNode, "current aircraft mass"),
        ];

        Self {
            entries: entries.into_iter().map(|meta| (meta.variable, meta)).collect(),
        }
    }

    /// Adds or replaces the metadata for `meta.variable`.
    ///
    /// Returns the metadata previously registered for that variable, if any.
    pub fn register(&mut self, meta: VariableMeta) -> Option<VariableMeta> {
        self.entries.insert(meta.variable, meta)
    }

    #[must_use]
    pub fn get(&self, variable: Variable) -> Option<&VariableMeta> {
        self.entries.get(&variable)
    }

    #[must_use]
    pub fn contains(&self, variable: Variable) -> bool {
        self.entries.contains_key(&variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableMeta> {
        self.entries.values()
    }
}

use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Geometry kind of the feature being styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    /// Point or multi-point.
    Point,
    /// Line or multi-line.
    LineString,
    /// Polygon or multi-polygon.
    Polygon,
    /// Anything else.
    Unknown,
}

impl GeometryType {
    /// Name reported by `geometry-type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of zoom and feature data supplied to every evaluation.
///
/// Implementations must not change what they report during one evaluation.
pub trait RuntimeContext {
    /// Current zoom level.
    fn zoom(&self) -> f64;
    /// Feature properties, or `None` when no feature is in scope.
    fn properties(&self) -> Option<&BTreeMap<String, Value>>;
    /// Geometry kind of the feature, if known.
    fn geometry_type(&self) -> Option<GeometryType>;
    /// Feature id, if any.
    fn id(&self) -> Option<&Value>;
    /// Mutable per-feature state kept by the renderer, if any.
    fn feature_state(&self) -> Option<&BTreeMap<String, Value>>;
}

/// A feature as seen by the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Feature {
    /// Optional feature id.
    pub id: Option<Value>,
    /// Geometry kind.
    pub geometry_type: Option<GeometryType>,
    /// Property bag.
    pub properties: BTreeMap<String, Value>,
}

impl Feature {
    /// A feature with the given properties and nothing else.
    pub fn with_properties(properties: BTreeMap<String, Value>) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }
}

/// Plain [`RuntimeContext`] borrowing a feature and its state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationContext<'a> {
    /// Zoom level.
    pub zoom: f64,
    /// Feature being styled.
    pub feature: Option<&'a Feature>,
    /// Feature state.
    pub state: Option<&'a BTreeMap<String, Value>>,
}

impl<'a> EvaluationContext<'a> {
    /// Context at `zoom` with no feature in scope.
    pub fn at_zoom(zoom: f64) -> Self {
        Self {
            zoom,
            ..Self::default()
        }
    }

    /// Context for `feature` at `zoom`.
    pub fn new(zoom: f64, feature: &'a Feature) -> Self {
        Self {
            zoom,
            feature: Some(feature),
            state: None,
        }
    }

    /// Attach feature state.
    pub fn with_state(mut self, state: &'a BTreeMap<String, Value>) -> Self {
        self.state = Some(state);
        self
    }
}

impl RuntimeContext for EvaluationContext<'_> {
    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn properties(&self) -> Option<&BTreeMap<String, Value>> {
        self.feature.map(|f| &f.properties)
    }

    fn geometry_type(&self) -> Option<GeometryType> {
        self.feature.and_then(|f| f.geometry_type)
    }

    fn id(&self) -> Option<&Value> {
        self.feature.and_then(|f| f.id.as_ref())
    }

    fn feature_state(&self) -> Option<&BTreeMap<String, Value>> {
        self.state
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/context.rs"]
mod tests;

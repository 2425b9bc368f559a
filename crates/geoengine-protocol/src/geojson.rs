//! GeoJSON types for WFS responses and dataset uploads.
//!
//! The WFS endpoint returns a plain GeoJSON FeatureCollection where each
//! feature additionally carries a `when` member with its validity interval.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::VectorDataType;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features.extend(features);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional feature identifier (string or number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// `null` for features without geometry.
    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Validity interval, only present in WFS responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<When>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry>) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry,
            properties: Map::new(),
            when: None,
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::new(Some(Geometry::point(x, y)))
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_when(mut self, when: When) -> Self {
        self.when = Some(when);
        self
    }
}

/// Per-feature time as the WFS endpoint writes it.
///
/// Bounds are ISO 8601 strings; the server's beginning and end of time are
/// written with years far outside the usual calendar range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct When {
    pub start: String,
    pub end: String,
    /// Always "Interval".
    #[serde(rename = "type")]
    pub type_: String,
}

impl When {
    pub fn interval(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            type_: "Interval".to_string(),
        }
    }
}

/// GeoJSON geometry types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    /// Rings: the first is the exterior, the rest are holes.
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point {
            coordinates: [x, y],
        }
    }

    pub fn line_string(coordinates: Vec<[f64; 2]>) -> Self {
        Geometry::LineString { coordinates }
    }

    pub fn polygon(coordinates: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates }
    }

    /// The collection type the server stores this geometry as.
    pub fn vector_data_type(&self) -> VectorDataType {
        match self {
            Geometry::Point { .. } | Geometry::MultiPoint { .. } => VectorDataType::MultiPoint,
            Geometry::LineString { .. } | Geometry::MultiLineString { .. } => {
                VectorDataType::MultiLineString
            }
            Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => {
                VectorDataType::MultiPolygon
            }
        }
    }

    /// All vertices, in order.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        match self {
            Geometry::Point { coordinates } => vec![*coordinates],
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.clone()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().copied().collect()
            }
        }
    }
}

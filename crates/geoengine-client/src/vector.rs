//! Feature tables: geometry, attribute columns and per-feature time.
//!
//! WFS responses decode into a [`FeatureTable`]; uploads go the other way
//! through [`FeatureTable::to_feature_collection`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use tracing::warn;

use geoengine_common::time::parse_instant;
use geoengine_common::{GeoEngineError, GeoEngineResult, SpatialReference};
use geoengine_protocol::{
    Feature, FeatureCollection, FeatureDataType, Geometry, VectorColumnInfo, VectorDataType,
    VectorResultDescriptor,
};

/// Values of one attribute column; `None` is a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> FeatureDataType {
        match self {
            ColumnData::Int(_) => FeatureDataType::Int,
            ColumnData::Float(_) => FeatureDataType::Float,
            ColumnData::Text(_) => FeatureDataType::Text,
            ColumnData::Bool(_) => FeatureDataType::Bool,
        }
    }

    /// The value at `row` as JSON, `null` when missing or not finite.
    pub fn json_value(&self, row: usize) -> Value {
        match self {
            ColumnData::Int(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::from),
            ColumnData::Float(v) => v
                .get(row)
                .copied()
                .flatten()
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
            ColumnData::Text(v) => v
                .get(row)
                .cloned()
                .flatten()
                .map_or(Value::Null, Value::String),
            ColumnData::Bool(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Bool),
        }
    }

    pub fn as_int(&self) -> Option<&[Option<i64>]> {
        match self {
            ColumnData::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            ColumnData::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[Option<bool>]> {
        match self {
            ColumnData::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Build a column from JSON values, using the declared type if known and
    /// inferring one from the values otherwise.
    fn from_json(values: &[Option<&Value>], declared: Option<FeatureDataType>) -> Self {
        let data_type = declared.unwrap_or_else(|| infer_data_type(values));

        match data_type {
            FeatureDataType::Int | FeatureDataType::Category => ColumnData::Int(
                values
                    .iter()
                    .map(|v| {
                        v.and_then(|v| {
                            v.as_i64()
                                .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                        })
                    })
                    .collect(),
            ),
            FeatureDataType::Float => {
                ColumnData::Float(values.iter().map(|v| v.and_then(Value::as_f64)).collect())
            }
            FeatureDataType::Bool => {
                ColumnData::Bool(values.iter().map(|v| v.and_then(Value::as_bool)).collect())
            }
            FeatureDataType::Text | FeatureDataType::DateTime => ColumnData::Text(
                values
                    .iter()
                    .map(|v| match v {
                        None | Some(Value::Null) => None,
                        Some(Value::String(s)) => Some(s.clone()),
                        Some(other) => Some(other.to_string()),
                    })
                    .collect(),
            ),
        }
    }
}

fn infer_data_type(values: &[Option<&Value>]) -> FeatureDataType {
    let present: Vec<&Value> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_null())
        .collect();

    if present.is_empty() {
        FeatureDataType::Text
    } else if present.iter().all(|v| v.is_i64() || v.is_u64()) {
        FeatureDataType::Int
    } else if present.iter().all(|v| v.is_number()) {
        FeatureDataType::Float
    } else if present.iter().all(|v| v.is_boolean()) {
        FeatureDataType::Bool
    } else {
        FeatureDataType::Text
    }
}

/// A table of features with one optional geometry per row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    geometry: Vec<Option<Geometry>>,
    columns: BTreeMap<String, ColumnData>,
    start: Vec<Option<DateTime<Utc>>>,
    end: Vec<Option<DateTime<Utc>>>,
    spatial_reference: Option<SpatialReference>,
}

impl FeatureTable {
    /// A table with the given geometries and no attributes.
    pub fn new(geometry: Vec<Option<Geometry>>) -> Self {
        let rows = geometry.len();
        Self {
            geometry,
            columns: BTreeMap::new(),
            start: vec![None; rows],
            end: vec![None; rows],
            spatial_reference: None,
        }
    }

    pub fn with_spatial_reference(mut self, spatial_reference: SpatialReference) -> Self {
        self.spatial_reference = Some(spatial_reference);
        self
    }

    /// Add or replace a column. Its length must match the number of rows.
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> GeoEngineResult<Self> {
        let name = name.into();
        if data.len() != self.len() {
            return Err(GeoEngineError::InvalidInput(format!(
                "column {} has {} values but the table has {} rows",
                name,
                data.len(),
                self.len()
            )));
        }
        self.columns.insert(name, data);
        Ok(self)
    }

    pub fn with_time(
        mut self,
        start: Vec<Option<DateTime<Utc>>>,
        end: Vec<Option<DateTime<Utc>>>,
    ) -> GeoEngineResult<Self> {
        if start.len() != self.len() || end.len() != self.len() {
            return Err(GeoEngineError::InvalidInput(format!(
                "time columns must have {} values",
                self.len()
            )));
        }
        self.start = start;
        self.end = end;
        Ok(self)
    }

    /// Decode a WFS response.
    ///
    /// Declared column types from the workflow's descriptor take precedence
    /// over types inferred from the values.
    pub fn from_geojson(
        collection: FeatureCollection,
        spatial_reference: Option<SpatialReference>,
        declared: Option<&BTreeMap<String, VectorColumnInfo>>,
    ) -> Self {
        let rows = collection.features.len();

        let mut names: BTreeSet<String> = collection
            .features
            .iter()
            .flat_map(|f| f.properties.keys().cloned())
            .collect();
        if let Some(declared) = declared {
            names.extend(declared.keys().cloned());
        }

        let mut columns = BTreeMap::new();
        for name in names {
            let values: Vec<Option<&Value>> = collection
                .features
                .iter()
                .map(|f| f.properties.get(&name))
                .collect();
            let declared_type = declared.and_then(|d| d.get(&name)).map(|c| c.data_type);
            let data = ColumnData::from_json(&values, declared_type);
            columns.insert(name, data);
        }

        let mut undecodable = 0usize;
        let mut parse_bound = |bound: &str| -> Option<DateTime<Utc>> {
            match parse_instant(bound) {
                Ok(t) => Some(t),
                // beginning and end of time are written with years chrono can't hold
                Err(_) if bound.starts_with('-') || bound.starts_with('+') => None,
                Err(_) => {
                    undecodable += 1;
                    None
                }
            }
        };

        let mut geometry = Vec::with_capacity(rows);
        let mut start = Vec::with_capacity(rows);
        let mut end = Vec::with_capacity(rows);
        for feature in collection.features {
            match &feature.when {
                Some(when) => {
                    start.push(parse_bound(&when.start));
                    end.push(parse_bound(&when.end));
                }
                None => {
                    start.push(None);
                    end.push(None);
                }
            }
            geometry.push(feature.geometry);
        }

        if undecodable > 0 {
            warn!(count = undecodable, "Could not decode feature time bounds");
        }

        Self {
            geometry,
            columns,
            start,
            end,
            spatial_reference,
        }
    }

    /// Replace integer codes of classification columns with their class names.
    /// Codes without a class become missing values.
    pub fn resolve_classifications(&mut self, descriptor: &VectorResultDescriptor) {
        for (name, classes) in descriptor.classification_columns() {
            let Some(column) = self.columns.get_mut(name) else {
                continue;
            };

            let codes: Vec<Option<i64>> = match column {
                ColumnData::Int(values) => values.clone(),
                ColumnData::Float(values) => values
                    .iter()
                    .map(|v| v.filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .collect(),
                _ => continue,
            };

            *column = ColumnData::Text(
                codes
                    .into_iter()
                    .map(|code| code.and_then(|c| classes.get(&c).cloned()))
                    .collect(),
            );
        }
    }

    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    pub fn geometry(&self) -> &[Option<Geometry>] {
        &self.geometry
    }

    pub fn columns(&self) -> &BTreeMap<String, ColumnData> {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn start(&self) -> &[Option<DateTime<Utc>>] {
        &self.start
    }

    pub fn end(&self) -> &[Option<DateTime<Utc>>] {
        &self.end
    }

    pub fn spatial_reference(&self) -> Option<&SpatialReference> {
        self.spatial_reference.as_ref()
    }

    /// Collection type of the first geometry, `Data` if there is none.
    pub fn vector_data_type(&self) -> VectorDataType {
        self.geometry
            .iter()
            .flatten()
            .next()
            .map_or(VectorDataType::Data, Geometry::vector_data_type)
    }

    pub fn column_infos(&self) -> BTreeMap<String, VectorColumnInfo> {
        self.columns
            .iter()
            .map(|(name, data)| (name.clone(), VectorColumnInfo::unitless(data.data_type())))
            .collect()
    }

    /// Descriptor of this table as a dataset. Needs a spatial reference.
    pub fn result_descriptor(&self) -> GeoEngineResult<VectorResultDescriptor> {
        let spatial_reference = self.spatial_reference.clone().ok_or_else(|| {
            GeoEngineError::InvalidInput("feature table has no spatial reference".to_string())
        })?;

        Ok(VectorResultDescriptor {
            data_type: self.vector_data_type(),
            spatial_reference,
            columns: self.column_infos(),
            time: None,
            bbox: None,
        })
    }

    /// Encode as GeoJSON, one feature per row.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .geometry
            .iter()
            .enumerate()
            .map(|(row, geometry)| {
                let properties: Map<String, Value> = self
                    .columns
                    .iter()
                    .map(|(name, data)| (name.clone(), data.json_value(row)))
                    .collect();

                let mut feature = Feature::new(geometry.clone());
                feature.properties = properties;
                feature
            })
            .collect();

        FeatureCollection::new().with_features(features)
    }
}

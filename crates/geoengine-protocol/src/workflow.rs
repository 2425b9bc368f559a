//! Workflow definitions and operator trees.
//!
//! A workflow is `{type, operator}` where `operator` is a nested tree of
//! `{type, params, sources}` objects. The operators this client knows about
//! are modelled as typed variants; anything else round-trips through
//! [`Operator::Raw`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use geoengine_common::{
    DatasetName, GeoEngineError, ResultKind, SpatialReference, TimeGranularity, TimeStep,
};

use crate::descriptor::RasterDataType;

/// A workflow definition as registered with `POST /workflow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub operator: Operator,
}

impl Workflow {
    /// Create a workflow, checking that a typed root operator produces `kind`.
    pub fn new(kind: ResultKind, operator: Operator) -> Result<Self, WorkflowError> {
        let workflow = Self { kind, operator };
        workflow.validate()?;
        Ok(workflow)
    }

    pub fn raster(operator: Operator) -> Result<Self, WorkflowError> {
        Self::new(ResultKind::Raster, operator)
    }

    pub fn vector(operator: Operator) -> Result<Self, WorkflowError> {
        Self::new(ResultKind::Vector, operator)
    }

    pub fn plot(operator: Operator) -> Result<Self, WorkflowError> {
        Self::new(ResultKind::Plot, operator)
    }

    /// Parse an untyped definition, checking only what can be known locally:
    /// a JSON object with a recognized `type` and an `operator` object.
    pub fn from_json(definition: Value) -> Result<Self, WorkflowError> {
        let object = definition.as_object().ok_or(WorkflowError::NotAnObject)?;

        let kind = match object.get("type") {
            None => return Err(WorkflowError::MissingField("type")),
            Some(Value::String(s)) => match s.as_str() {
                "Raster" => ResultKind::Raster,
                "Vector" => ResultKind::Vector,
                "Plot" => ResultKind::Plot,
                other => return Err(WorkflowError::UnknownType(other.to_string())),
            },
            Some(other) => return Err(WorkflowError::UnknownType(other.to_string())),
        };

        let operator = match object.get("operator") {
            None => return Err(WorkflowError::MissingField("operator")),
            Some(op @ Value::Object(_)) => serde_json::from_value(op.clone())
                .map_err(|e| WorkflowError::InvalidOperator(e.to_string()))?,
            Some(_) => {
                return Err(WorkflowError::InvalidOperator(
                    "operator must be a JSON object".to_string(),
                ))
            }
        };

        Self::new(kind, operator)
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        self.operator.validate()?;
        match self.operator.output_kind() {
            Some(actual) if actual != self.kind => Err(WorkflowError::KindMismatch {
                declared: self.kind,
                operator: self.operator.name(),
                actual,
            }),
            _ => Ok(()),
        }
    }
}

/// A node in an operator tree.
///
/// Deserializing an object whose `type` names a known operator but whose
/// params don't match the typed shape yields `Raw` instead of failing, so
/// definitions written for newer servers still round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum Operator {
    GdalSource {
        params: GdalSourceParams,
    },
    OgrSource {
        params: OgrSourceParams,
    },
    /// Raster band math over named sources (`A`, `B`, ...).
    Expression {
        params: ExpressionParams,
        sources: BTreeMap<String, Operator>,
    },
    RasterVectorJoin {
        params: RasterVectorJoinParams,
        sources: RasterVectorJoinSources,
    },
    PointInPolygonFilter {
        #[serde(default)]
        params: EmptyParams,
        sources: PointInPolygonSources,
    },
    Reprojection {
        params: ReprojectionParams,
        sources: SingleSource,
    },
    RasterTypeConversion {
        params: RasterTypeConversionParams,
        sources: RasterSource,
    },
    RasterScaling {
        params: RasterScalingParams,
        sources: RasterSource,
    },
    Interpolation {
        params: InterpolationParams,
        sources: RasterSource,
    },
    TemporalRasterAggregation {
        params: TemporalRasterAggregationParams,
        sources: RasterSource,
    },
    TimeShift {
        params: TimeShiftParams,
        sources: SingleSource,
    },
    Histogram {
        params: HistogramParams,
        sources: SingleSource,
    },
    /// Any operator the client does not model, passed through verbatim.
    #[serde(untagged)]
    Raw(Value),
}

impl Operator {
    pub fn gdal_source(data: impl Into<DatasetName>) -> Self {
        Operator::GdalSource {
            params: GdalSourceParams { data: data.into() },
        }
    }

    pub fn ogr_source(data: impl Into<DatasetName>) -> Self {
        Operator::OgrSource {
            params: OgrSourceParams {
                data: data.into(),
                attribute_projection: None,
                attribute_filters: None,
            },
        }
    }

    pub fn expression(
        expression: impl Into<String>,
        output_type: RasterDataType,
        sources: impl IntoIterator<Item = (String, Operator)>,
    ) -> Self {
        Operator::Expression {
            params: ExpressionParams {
                expression: expression.into(),
                output_type,
                map_no_data: false,
            },
            sources: sources.into_iter().collect(),
        }
    }

    pub fn raster_vector_join(
        vector: Operator,
        rasters: Vec<Operator>,
        names: Vec<String>,
        temporal_aggregation: TemporalAggregation,
        feature_aggregation: FeatureAggregation,
    ) -> Self {
        Operator::RasterVectorJoin {
            params: RasterVectorJoinParams {
                names,
                temporal_aggregation,
                feature_aggregation,
            },
            sources: RasterVectorJoinSources {
                vector: Box::new(vector),
                rasters,
            },
        }
    }

    pub fn point_in_polygon_filter(points: Operator, polygons: Operator) -> Self {
        Operator::PointInPolygonFilter {
            params: EmptyParams::default(),
            sources: PointInPolygonSources {
                points: Box::new(points),
                polygons: Box::new(polygons),
            },
        }
    }

    pub fn reprojection(source: Operator, target: SpatialReference) -> Self {
        Operator::Reprojection {
            params: ReprojectionParams {
                target_spatial_reference: target,
            },
            sources: SingleSource::new(source),
        }
    }

    pub fn raster_type_conversion(raster: Operator, output_data_type: RasterDataType) -> Self {
        Operator::RasterTypeConversion {
            params: RasterTypeConversionParams { output_data_type },
            sources: RasterSource::new(raster),
        }
    }

    pub fn interpolation(raster: Operator, interpolation: InterpolationMethod) -> Self {
        Operator::Interpolation {
            params: InterpolationParams {
                interpolation,
                input_resolution: InputResolution::Source,
            },
            sources: RasterSource::new(raster),
        }
    }

    pub fn temporal_raster_aggregation(
        raster: Operator,
        aggregation: AggregationType,
        ignore_no_data: bool,
        window: TimeStep,
    ) -> Self {
        Operator::TemporalRasterAggregation {
            params: TemporalRasterAggregationParams {
                aggregation: Aggregation {
                    kind: aggregation,
                    ignore_no_data,
                },
                window,
                output_type: None,
            },
            sources: RasterSource::new(raster),
        }
    }

    pub fn time_shift(source: Operator, granularity: TimeGranularity, value: i64) -> Self {
        Operator::TimeShift {
            params: TimeShiftParams::Relative { granularity, value },
            sources: SingleSource::new(source),
        }
    }

    pub fn histogram(source: Operator, attribute_name: Option<String>, buckets: u8) -> Self {
        Operator::Histogram {
            params: HistogramParams {
                attribute_name,
                bounds: HistogramBounds::data(),
                buckets: HistogramBuckets::Number { value: buckets },
                interactive: false,
            },
            sources: SingleSource::new(source),
        }
    }

    /// The operator's `type` string.
    pub fn name(&self) -> String {
        match self {
            Operator::GdalSource { .. } => "GdalSource".to_string(),
            Operator::OgrSource { .. } => "OgrSource".to_string(),
            Operator::Expression { .. } => "Expression".to_string(),
            Operator::RasterVectorJoin { .. } => "RasterVectorJoin".to_string(),
            Operator::PointInPolygonFilter { .. } => "PointInPolygonFilter".to_string(),
            Operator::Reprojection { .. } => "Reprojection".to_string(),
            Operator::RasterTypeConversion { .. } => "RasterTypeConversion".to_string(),
            Operator::RasterScaling { .. } => "RasterScaling".to_string(),
            Operator::Interpolation { .. } => "Interpolation".to_string(),
            Operator::TemporalRasterAggregation { .. } => "TemporalRasterAggregation".to_string(),
            Operator::TimeShift { .. } => "TimeShift".to_string(),
            Operator::Histogram { .. } => "Histogram".to_string(),
            Operator::Raw(value) => value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("<untyped>")
                .to_string(),
        }
    }

    /// What this operator produces, if it can be told without asking the server.
    ///
    /// Reprojection and TimeShift produce whatever their source produces.
    pub fn output_kind(&self) -> Option<ResultKind> {
        match self {
            Operator::GdalSource { .. }
            | Operator::Expression { .. }
            | Operator::RasterTypeConversion { .. }
            | Operator::RasterScaling { .. }
            | Operator::Interpolation { .. }
            | Operator::TemporalRasterAggregation { .. } => Some(ResultKind::Raster),
            Operator::OgrSource { .. }
            | Operator::RasterVectorJoin { .. }
            | Operator::PointInPolygonFilter { .. } => Some(ResultKind::Vector),
            Operator::Histogram { .. } => Some(ResultKind::Plot),
            Operator::Reprojection { sources, .. } | Operator::TimeShift { sources, .. } => {
                sources.source.output_kind()
            }
            Operator::Raw(_) => None,
        }
    }

    /// Check source kinds and parameter consistency through the whole tree.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        match self {
            Operator::GdalSource { .. } | Operator::OgrSource { .. } => Ok(()),
            Operator::Raw(value) => {
                if value.get("type").and_then(Value::as_str).is_some() {
                    Ok(())
                } else {
                    Err(WorkflowError::InvalidOperator(
                        "operator object without a string `type`".to_string(),
                    ))
                }
            }
            Operator::Expression { params, sources } => {
                if params.expression.trim().is_empty() {
                    return Err(WorkflowError::InvalidOperator(
                        "Expression requires a non-empty expression".to_string(),
                    ));
                }
                if sources.is_empty() {
                    return Err(WorkflowError::InvalidOperator(
                        "Expression requires at least one raster source".to_string(),
                    ));
                }
                sources
                    .values()
                    .try_for_each(|s| expect_source(self, s, ResultKind::Raster))
            }
            Operator::RasterVectorJoin { params, sources } => {
                if params.names.len() != sources.rasters.len() {
                    return Err(WorkflowError::InvalidOperator(format!(
                        "RasterVectorJoin has {} raster sources but {} column names",
                        sources.rasters.len(),
                        params.names.len()
                    )));
                }
                expect_source(self, &sources.vector, ResultKind::Vector)?;
                sources
                    .rasters
                    .iter()
                    .try_for_each(|s| expect_source(self, s, ResultKind::Raster))
            }
            Operator::PointInPolygonFilter { sources, .. } => {
                expect_source(self, &sources.points, ResultKind::Vector)?;
                expect_source(self, &sources.polygons, ResultKind::Vector)
            }
            Operator::RasterTypeConversion { sources, .. }
            | Operator::RasterScaling { sources, .. }
            | Operator::Interpolation { sources, .. }
            | Operator::TemporalRasterAggregation { sources, .. } => {
                expect_source(self, &sources.raster, ResultKind::Raster)
            }
            Operator::Reprojection { sources, .. } | Operator::TimeShift { sources, .. } => {
                if sources.source.output_kind() == Some(ResultKind::Plot) {
                    return Err(WorkflowError::SourceKindMismatch {
                        operator: self.name(),
                        expected: ResultKind::Raster,
                        actual: ResultKind::Plot,
                    });
                }
                sources.source.validate()
            }
            Operator::Histogram { sources, .. } => sources.source.validate(),
        }
    }
}

fn expect_source(
    parent: &Operator,
    source: &Operator,
    expected: ResultKind,
) -> Result<(), WorkflowError> {
    match source.output_kind() {
        Some(actual) if actual != expected => Err(WorkflowError::SourceKindMismatch {
            operator: parent.name(),
            expected,
            actual,
        }),
        _ => source.validate(),
    }
}

// ============================================================================
// Params
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GdalSourceParams {
    pub data: DatasetName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct OgrSourceParams {
    pub data: DatasetName,
    pub attribute_projection: Option<Vec<String>>,
    pub attribute_filters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionParams {
    pub expression: String,
    pub output_type: RasterDataType,
    #[serde(default)]
    pub map_no_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemporalAggregation {
    None,
    First,
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureAggregation {
    First,
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct RasterVectorJoinParams {
    /// One new column name per raster source.
    pub names: Vec<String>,
    pub temporal_aggregation: TemporalAggregation,
    pub feature_aggregation: FeatureAggregation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RasterVectorJoinSources {
    pub vector: Box<Operator>,
    pub rasters: Vec<Operator>,
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointInPolygonSources {
    pub points: Box<Operator>,
    pub polygons: Box<Operator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct ReprojectionParams {
    pub target_spatial_reference: SpatialReference,
}

/// `{"source": ...}` for operators that accept raster or vector input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleSource {
    pub source: Box<Operator>,
}

impl SingleSource {
    pub fn new(source: Operator) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

/// `{"raster": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RasterSource {
    pub raster: Box<Operator>,
}

impl RasterSource {
    pub fn new(raster: Operator) -> Self {
        Self {
            raster: Box::new(raster),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct RasterTypeConversionParams {
    pub output_data_type: RasterDataType,
}

/// Where RasterScaling takes its slope or offset from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SlopeOffsetSelection {
    DeriveFromData,
    Constant { value: f64 },
    MetadataKey { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalingMode {
    /// `x * slope + offset`
    MulSlopeAddOffset,
    /// `(x - offset) / slope`
    SubOffsetDivSlope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct RasterScalingParams {
    pub offset: SlopeOffsetSelection,
    pub slope: SlopeOffsetSelection,
    pub scaling_mode: ScalingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterpolationMethod {
    NearestNeighbor,
    BiLinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputResolution {
    Source,
    Value { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationParams {
    pub interpolation: InterpolationMethod,
    pub input_resolution: InputResolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationType {
    Mean,
    Min,
    Max,
    Median,
    Count,
    Sum,
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    #[serde(rename = "type")]
    pub kind: AggregationType,
    #[serde(default)]
    pub ignore_no_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct TemporalRasterAggregationParams {
    pub aggregation: Aggregation,
    pub window: TimeStep,
    #[serde(default)]
    pub output_type: Option<RasterDataType>,
}

/// Only relative shifts are modelled; absolute shifts come back as `Operator::Raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimeShiftParams {
    Relative {
        granularity: TimeGranularity,
        value: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBounds {
    #[serde(rename = "data")]
    Data,
}

/// Histogram range: derived from the data (`"data"`) or fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(untagged)]
pub enum HistogramBounds {
    Data(DataBounds),
    Values { min: f64, max: f64 },
}

impl HistogramBounds {
    pub fn data() -> Self {
        HistogramBounds::Data(DataBounds::Data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HistogramBuckets {
    Number {
        value: u8,
    },
    #[serde(rename_all = "camelCase")]
    SquareRootChoiceRule {
        max_number_of_buckets: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct HistogramParams {
    /// Column to bin for vector input; `None` for raster input.
    #[serde(default)]
    pub attribute_name: Option<String>,
    pub bounds: HistogramBounds,
    pub buckets: HistogramBuckets,
    #[serde(default)]
    pub interactive: bool,
}

// ============================================================================
// Errors
// ============================================================================

/// Problems with a workflow definition detected before it is sent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Workflow definition must be a JSON object")]
    NotAnObject,

    #[error("Workflow definition is missing `{0}`")]
    MissingField(&'static str),

    #[error("Unknown workflow type {0}. Expected one of Raster, Vector, Plot")]
    UnknownType(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Workflow declares {declared} but its {operator} operator produces {actual}")]
    KindMismatch {
        declared: ResultKind,
        operator: String,
        actual: ResultKind,
    },

    #[error("{operator} expects a {expected} source but got {actual}")]
    SourceKindMismatch {
        operator: String,
        expected: ResultKind,
        actual: ResultKind,
    },
}

impl From<WorkflowError> for GeoEngineError {
    fn from(err: WorkflowError) -> Self {
        GeoEngineError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gdal_source_wire_shape() {
        let workflow = Workflow::raster(Operator::gdal_source("ndvi")).unwrap();
        assert_eq!(
            serde_json::to_value(&workflow).unwrap(),
            json!({
                "type": "Raster",
                "operator": {"type": "GdalSource", "params": {"data": "ndvi"}}
            })
        );
    }

    #[test]
    fn test_ogr_source_keeps_null_params() {
        let value = serde_json::to_value(Operator::ogr_source("ne_10m_ports")).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "OgrSource",
                "params": {
                    "data": "ne_10m_ports",
                    "attributeProjection": null,
                    "attributeFilters": null
                }
            })
        );
    }

    #[test]
    fn test_nested_join_round_trip() {
        let join = Operator::raster_vector_join(
            Operator::ogr_source("ports"),
            vec![Operator::gdal_source("ndvi")],
            vec!["ndvi".to_string()],
            TemporalAggregation::None,
            FeatureAggregation::Mean,
        );
        let workflow = Workflow::vector(join).unwrap();
        let json = serde_json::to_value(&workflow).unwrap();
        assert_eq!(json["operator"]["sources"]["rasters"][0]["type"], "GdalSource");
        assert_eq!(json["operator"]["params"]["temporalAggregation"], "none");

        let back: Workflow = serde_json::from_value(json).unwrap();
        assert_eq!(back, workflow);
    }

    #[test]
    fn test_unknown_operator_is_raw() {
        let definition = json!({
            "type": "Vector",
            "operator": {
                "type": "ColumnRangeFilter",
                "params": {"column": "natlscale", "ranges": [[1, 2]]},
                "sources": {"vector": {"type": "OgrSource", "params": {"data": "ports"}}}
            }
        });
        let workflow = Workflow::from_json(definition.clone()).unwrap();
        assert!(matches!(workflow.operator, Operator::Raw(_)));
        assert_eq!(workflow.operator.name(), "ColumnRangeFilter");
        assert_eq!(serde_json::to_value(&workflow).unwrap(), definition);
    }

    #[test]
    fn test_from_json_rejects_unknown_type() {
        let err = Workflow::from_json(json!({
            "type": "Table",
            "operator": {"type": "GdalSource", "params": {"data": "ndvi"}}
        }))
        .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownType(t) if t == "Table"));
    }

    #[test]
    fn test_from_json_requires_operator() {
        let err = Workflow::from_json(json!({"type": "Raster"})).unwrap_err();
        assert_eq!(err, WorkflowError::MissingField("operator"));
        assert!(matches!(
            Workflow::from_json(json!([1, 2])),
            Err(WorkflowError::NotAnObject)
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let err = Workflow::vector(Operator::gdal_source("ndvi")).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::KindMismatch {
                declared: ResultKind::Vector,
                actual: ResultKind::Raster,
                ..
            }
        ));
    }

    #[test]
    fn test_reprojection_inherits_kind() {
        let op = Operator::reprojection(
            Operator::ogr_source("ports"),
            "EPSG:3857".parse().unwrap(),
        );
        assert_eq!(op.output_kind(), Some(ResultKind::Vector));

        let shifted = Operator::time_shift(Operator::gdal_source("ndvi"), TimeGranularity::Months, -1);
        assert_eq!(shifted.output_kind(), Some(ResultKind::Raster));
        assert_eq!(
            serde_json::to_value(&shifted).unwrap()["params"],
            json!({"type": "relative", "granularity": "months", "value": -1})
        );
    }

    #[test]
    fn test_expression_rejects_vector_source() {
        let op = Operator::expression(
            "A + 1",
            RasterDataType::F32,
            [("A".to_string(), Operator::ogr_source("ports"))],
        );
        assert!(matches!(
            op.validate(),
            Err(WorkflowError::SourceKindMismatch { .. })
        ));
    }

    #[test]
    fn test_join_name_count_checked() {
        let op = Operator::raster_vector_join(
            Operator::ogr_source("ports"),
            vec![Operator::gdal_source("a"), Operator::gdal_source("b")],
            vec!["a".to_string()],
            TemporalAggregation::First,
            FeatureAggregation::First,
        );
        assert!(op.validate().is_err());
    }

    #[test]
    fn test_histogram_wire_shape() {
        let op = Operator::histogram(Operator::gdal_source("ndvi"), None, 20);
        let workflow = Workflow::plot(op).unwrap();
        let json = serde_json::to_value(&workflow).unwrap();
        assert_eq!(json["operator"]["params"]["bounds"], "data");
        assert_eq!(
            json["operator"]["params"]["buckets"],
            json!({"type": "number", "value": 20})
        );
        let back: Workflow = serde_json::from_value(json).unwrap();
        assert_eq!(back, workflow);
    }

    #[test]
    fn test_temporal_aggregation_wire_shape() {
        let op = Operator::temporal_raster_aggregation(
            Operator::gdal_source("ndvi"),
            AggregationType::Mean,
            true,
            TimeStep::new(TimeGranularity::Months, 1),
        );
        assert_eq!(
            serde_json::to_value(&op).unwrap()["params"],
            json!({
                "aggregation": {"type": "mean", "ignoreNoData": true},
                "window": {"granularity": "months", "step": 1},
                "outputType": null
            })
        );
    }
}

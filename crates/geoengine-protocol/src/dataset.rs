//! Dataset creation, listing and provenance types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use geoengine_common::{
    DatasetName, QueryRectangle, RasterColorizer, SpatialPartition2D, SpatialResolution,
    TimeInterval, TimeStep, UploadId,
};

use crate::descriptor::{
    FeatureDataType, ResultDescriptor, VectorColumnInfo, VectorDataType, VectorResultDescriptor,
};

/// `{"id": ...}` answers, e.g. from `POST /upload` or `POST /workflow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse<T> {
    pub id: T,
}

/// Answer of `POST /dataset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatasetResponse {
    pub dataset_name: DatasetName,
}

/// Body of `POST /dataset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDataset {
    pub data_path: DataPath,
    pub definition: DatasetDefinition,
}

/// Where the server finds the dataset's files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataPath {
    /// A previous `POST /upload`
    Upload(UploadId),
    /// A server-side volume, by name
    Volume(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDefinition {
    pub properties: AddDatasetProperties,
    pub meta_data: MetaDataDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDatasetProperties {
    /// Server picks a name if `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<DatasetName>,
    pub display_name: String,
    pub description: String,
    /// "GdalSource" or "OgrSource"
    pub source_operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbology: Option<Symbology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Vec<Provenance>>,
}

impl AddDatasetProperties {
    pub fn new(
        display_name: impl Into<String>,
        description: impl Into<String>,
        source_operator: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            display_name: display_name.into(),
            description: description.into(),
            source_operator: source_operator.into(),
            symbology: None,
            provenance: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<DatasetName>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_symbology(mut self, symbology: Symbology) -> Self {
        self.symbology = Some(symbology);
        self
    }

    pub fn with_provenance(mut self, provenance: Vec<Provenance>) -> Self {
        self.provenance = Some(provenance);
        self
    }
}

/// How the server loads a dataset.
///
/// Only OGR vector loading is modelled; GDAL definitions are passed as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MetaDataDefinition {
    #[serde(rename_all = "camelCase")]
    OgrMetaData {
        loading_info: OgrSourceDataset,
        result_descriptor: VectorResultDescriptor,
    },
    #[serde(untagged)]
    Raw(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OgrSourceDataset {
    pub file_name: String,
    pub layer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<VectorDataType>,
    #[serde(default)]
    pub time: OgrSourceDatasetTimeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<OgrSourceColumnSpec>,
    pub on_error: OgrOnError,
}

/// Where a feature's time comes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OgrSourceDatasetTimeType {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Start {
        start_field: String,
        start_format: OgrSourceTimeFormat,
        duration: OgrSourceDurationSpec,
    },
    #[serde(rename_all = "camelCase")]
    StartEnd {
        start_field: String,
        start_format: OgrSourceTimeFormat,
        end_field: String,
        end_format: OgrSourceTimeFormat,
    },
    #[serde(rename_all = "camelCase")]
    StartDuration {
        start_field: String,
        start_format: OgrSourceTimeFormat,
        duration_field: String,
    },
}

impl OgrSourceDatasetTimeType {
    /// The attribute columns this time spec reads.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            OgrSourceDatasetTimeType::None => vec![],
            OgrSourceDatasetTimeType::Start { start_field, .. } => vec![start_field.as_str()],
            OgrSourceDatasetTimeType::StartEnd {
                start_field,
                end_field,
                ..
            } => vec![start_field.as_str(), end_field.as_str()],
            OgrSourceDatasetTimeType::StartDuration {
                start_field,
                duration_field,
                ..
            } => vec![start_field.as_str(), duration_field.as_str()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnixTimeStampType {
    EpochSeconds,
    EpochMilliseconds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "camelCase")]
pub enum OgrSourceTimeFormat {
    #[serde(rename_all = "camelCase")]
    Custom { custom_format: String },
    #[serde(rename_all = "camelCase")]
    UnixTimeStamp { timestamp_type: UnixTimeStampType },
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OgrSourceDurationSpec {
    Infinite,
    Zero,
    Value(TimeStep),
}

/// Attribute columns by type, as OGR should read them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OgrSourceColumnSpec {
    /// Coordinate columns for CSV-like sources; empty for GeoJSON.
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub int: Vec<String>,
    #[serde(default)]
    pub float: Vec<String>,
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub bool: Vec<String>,
    #[serde(default)]
    pub datetime: Vec<String>,
}

impl OgrSourceColumnSpec {
    /// Sort columns into the per-type lists, leaving geometry coordinates empty.
    pub fn from_columns(columns: &BTreeMap<String, VectorColumnInfo>) -> Self {
        let mut spec = Self::default();
        for (name, info) in columns {
            let bucket = match info.data_type {
                FeatureDataType::Int | FeatureDataType::Category => &mut spec.int,
                FeatureDataType::Float => &mut spec.float,
                FeatureDataType::Text => &mut spec.text,
                FeatureDataType::Bool => &mut spec.bool,
                FeatureDataType::DateTime => &mut spec.datetime,
            };
            bucket.push(name.clone());
        }
        spec
    }
}

/// What OGR does with a feature it can't read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OgrOnError {
    Ignore,
    #[default]
    Abort,
}

/// Dataset symbology. Vector symbologies are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Symbology {
    #[serde(rename_all = "camelCase")]
    Raster {
        opacity: f64,
        raster_colorizer: RasterColorizer,
    },
    #[serde(untagged)]
    Raw(Value),
}

/// Sort order for `GET /datasets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DatasetOrder {
    #[default]
    NameAsc,
    NameDesc,
}

impl DatasetOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetOrder::NameAsc => "NameAsc",
            DatasetOrder::NameDesc => "NameDesc",
        }
    }
}

/// One entry of `GET /datasets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListing {
    pub id: Uuid,
    pub name: DatasetName,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source_operator: String,
    pub result_descriptor: ResultDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbology: Option<Symbology>,
}

/// Answer of `GET /dataset/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: Uuid,
    pub name: DatasetName,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub result_descriptor: ResultDescriptor,
    pub source_operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbology: Option<Symbology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Vec<Provenance>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A server-side storage location datasets can be added from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Reference to the data behind a source operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DataId {
    #[serde(rename_all = "camelCase")]
    Internal { dataset_id: Uuid },
    #[serde(rename_all = "camelCase")]
    External { provider_id: Uuid, layer_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub citation: String,
    pub license: String,
    pub uri: String,
}

/// One entry of `GET /workflow/{id}/provenance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub data: Vec<DataId>,
    pub provenance: Provenance,
}

/// Query part of `POST /datasetFromWorkflow/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterQueryRectangle {
    pub spatial_bounds: SpatialPartition2D,
    pub time_interval: TimeInterval,
    pub spatial_resolution: SpatialResolution,
}

impl From<&QueryRectangle> for RasterQueryRectangle {
    fn from(query: &QueryRectangle) -> Self {
        Self {
            spatial_bounds: query.spatial_partition(),
            time_interval: *query.time(),
            spatial_resolution: *query.resolution(),
        }
    }
}

/// Body of `POST /datasetFromWorkflow/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetFromWorkflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<DatasetName>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub query: RasterQueryRectangle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoengine_common::{SpatialReference, TimeGranularity};
    use serde_json::json;

    #[test]
    fn test_create_dataset_wire_shape() {
        let mut columns = BTreeMap::new();
        columns.insert(
            "name".to_string(),
            VectorColumnInfo::unitless(FeatureDataType::Text),
        );
        columns.insert(
            "scale".to_string(),
            VectorColumnInfo::unitless(FeatureDataType::Float),
        );

        let upload: UploadId = "b2c3c1a0-8e55-4b3b-9f4b-c8d8e4a9f001".parse().unwrap();
        let create = CreateDataset {
            data_path: DataPath::Upload(upload),
            definition: DatasetDefinition {
                properties: AddDatasetProperties::new("Ports", "Upload", "OgrSource"),
                meta_data: MetaDataDefinition::OgrMetaData {
                    loading_info: OgrSourceDataset {
                        file_name: "geo.json".to_string(),
                        layer_name: "geo".to_string(),
                        data_type: Some(VectorDataType::MultiPoint),
                        time: OgrSourceDatasetTimeType::None,
                        columns: Some(OgrSourceColumnSpec::from_columns(&columns)),
                        on_error: OgrOnError::Abort,
                    },
                    result_descriptor: VectorResultDescriptor {
                        data_type: VectorDataType::MultiPoint,
                        spatial_reference: SpatialReference::epsg4326(),
                        columns,
                        time: None,
                        bbox: None,
                    },
                },
            },
        };

        let json = serde_json::to_value(&create).unwrap();
        assert_eq!(json["dataPath"], json!({"upload": upload.to_string()}));
        assert_eq!(json["definition"]["metaData"]["type"], "OgrMetaData");
        let loading = &json["definition"]["metaData"]["loadingInfo"];
        assert_eq!(loading["time"], json!({"type": "none"}));
        assert_eq!(loading["onError"], "abort");
        assert_eq!(loading["columns"]["float"], json!(["scale"]));
        assert_eq!(loading["columns"]["text"], json!(["name"]));
        assert!(json["definition"]["properties"].get("name").is_none());
    }

    #[test]
    fn test_time_type_wire_shape() {
        let time = OgrSourceDatasetTimeType::Start {
            start_field: "time".to_string(),
            start_format: OgrSourceTimeFormat::Auto,
            duration: OgrSourceDurationSpec::Value(TimeStep::new(TimeGranularity::Days, 1)),
        };
        assert_eq!(
            serde_json::to_value(&time).unwrap(),
            json!({
                "type": "start",
                "startField": "time",
                "startFormat": {"format": "auto"},
                "duration": {"type": "value", "granularity": "days", "step": 1}
            })
        );
        assert_eq!(time.fields(), vec!["time"]);
    }

    #[test]
    fn test_gdal_meta_data_is_raw() {
        let meta: MetaDataDefinition = serde_json::from_value(json!({
            "type": "GdalMetaDataRegular",
            "params": {"filePath": "ndvi.tif"}
        }))
        .unwrap();
        assert!(matches!(meta, MetaDataDefinition::Raw(_)));
    }

    #[test]
    fn test_provenance_entry() {
        let entries: Vec<ProvenanceEntry> = serde_json::from_value(json!([{
            "data": [{"type": "internal", "datasetId": "a626c880-1c41-489b-9e19-9596d129859c"}],
            "provenance": {"citation": "Sample Citation", "license": "Sample License", "uri": "http://example.org/"}
        }]))
        .unwrap();
        assert_eq!(entries[0].provenance.license, "Sample License");
        assert!(matches!(entries[0].data[0], DataId::Internal { .. }));
    }
}

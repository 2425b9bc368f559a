//! Result descriptors: the declared output schema of a workflow.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use geoengine_common::{
    BoundingBox2D, GeoEngineError, GeoEngineResult, ResultKind, SpatialPartition2D,
    SpatialReference, SpatialResolution, TimeInterval,
};

/// Declared output of a workflow, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResultDescriptor {
    Raster(RasterResultDescriptor),
    Vector(VectorResultDescriptor),
    Plot(PlotResultDescriptor),
}

impl ResultDescriptor {
    pub fn kind(&self) -> ResultKind {
        match self {
            ResultDescriptor::Raster(_) => ResultKind::Raster,
            ResultDescriptor::Vector(_) => ResultKind::Vector,
            ResultDescriptor::Plot(_) => ResultKind::Plot,
        }
    }

    pub fn spatial_reference(&self) -> &SpatialReference {
        match self {
            ResultDescriptor::Raster(d) => &d.spatial_reference,
            ResultDescriptor::Vector(d) => &d.spatial_reference,
            ResultDescriptor::Plot(d) => &d.spatial_reference,
        }
    }

    /// Fail with `SchemaMismatch` unless this descriptor declares `expected`.
    pub fn expect_kind(&self, expected: ResultKind) -> GeoEngineResult<()> {
        let actual = self.kind();
        if actual == expected {
            Ok(())
        } else {
            Err(GeoEngineError::SchemaMismatch { expected, actual })
        }
    }

    pub fn as_raster(&self) -> GeoEngineResult<&RasterResultDescriptor> {
        match self {
            ResultDescriptor::Raster(d) => Ok(d),
            other => Err(GeoEngineError::SchemaMismatch {
                expected: ResultKind::Raster,
                actual: other.kind(),
            }),
        }
    }

    pub fn as_vector(&self) -> GeoEngineResult<&VectorResultDescriptor> {
        match self {
            ResultDescriptor::Vector(d) => Ok(d),
            other => Err(GeoEngineError::SchemaMismatch {
                expected: ResultKind::Vector,
                actual: other.kind(),
            }),
        }
    }
}

/// Pixel data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RasterDataType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl RasterDataType {
    pub fn is_float(&self) -> bool {
        matches!(self, RasterDataType::F32 | RasterDataType::F64)
    }
}

/// Geometry type of a vector result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorDataType {
    /// Features without geometry
    Data,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

/// Attribute column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureDataType {
    Category,
    Int,
    Float,
    Text,
    Bool,
    DateTime,
}

/// What the numbers mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Measurement {
    Unitless,
    Continuous {
        measurement: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    /// Integer codes with class names, e.g. land cover types.
    Classification {
        measurement: String,
        #[serde(with = "class_keys")]
        classes: BTreeMap<i64, String>,
    },
}

impl Default for Measurement {
    fn default() -> Self {
        Measurement::Unitless
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterBandDescriptor {
    pub name: String,
    #[serde(default)]
    pub measurement: Measurement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterResultDescriptor {
    pub data_type: RasterDataType,
    pub spatial_reference: SpatialReference,
    #[serde(default, deserialize_with = "lenient_time", skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<SpatialPartition2D>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<SpatialResolution>,
    #[serde(default)]
    pub bands: Vec<RasterBandDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorColumnInfo {
    pub data_type: FeatureDataType,
    #[serde(default)]
    pub measurement: Measurement,
}

impl VectorColumnInfo {
    pub fn unitless(data_type: FeatureDataType) -> Self {
        Self {
            data_type,
            measurement: Measurement::Unitless,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorResultDescriptor {
    pub data_type: VectorDataType,
    pub spatial_reference: SpatialReference,
    #[serde(default)]
    pub columns: BTreeMap<String, VectorColumnInfo>,
    #[serde(default, deserialize_with = "lenient_time", skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox2D>,
}

impl VectorResultDescriptor {
    /// Columns carrying a classification measurement, with their class names.
    pub fn classification_columns(&self) -> impl Iterator<Item = (&str, &BTreeMap<i64, String>)> {
        self.columns.iter().filter_map(|(name, info)| match &info.measurement {
            Measurement::Classification { classes, .. } => Some((name.as_str(), classes)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotResultDescriptor {
    pub spatial_reference: SpatialReference,
    #[serde(default, deserialize_with = "lenient_time", skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox2D>,
}

/// Class codes travel as JSON object keys, i.e. strings.
mod class_keys {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(classes: &BTreeMap<i64, String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        classes
            .iter()
            .map(|(code, name)| (code.to_string(), name))
            .collect::<BTreeMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<i64, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(code, name)| {
                code.trim()
                    .parse::<i64>()
                    .map(|code| (code, name))
                    .map_err(|_| D::Error::custom(format!("class code {:?} is not an integer", code)))
            })
            .collect()
    }
}

/// Time bounds that the local calendar cannot represent (the server's
/// beginning/end of time) are dropped instead of failing the whole descriptor.
fn lenient_time<'de, D>(deserializer: D) -> Result<Option<TimeInterval>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plot_descriptor() {
        let descriptor: ResultDescriptor = serde_json::from_value(json!({
            "type": "plot",
            "spatialReference": "EPSG:4326",
        }))
        .unwrap();
        assert_eq!(descriptor.kind(), ResultKind::Plot);
        assert!(descriptor.expect_kind(ResultKind::Plot).is_ok());
    }

    #[test]
    fn test_parse_raster_descriptor() {
        let descriptor: ResultDescriptor = serde_json::from_value(json!({
            "type": "raster",
            "dataType": "U8",
            "spatialReference": "EPSG:4326",
            "time": {"start": -8334601228800000i64, "end": 8210266876799999i64},
            "bbox": {
                "upperLeftCoordinate": {"x": -180.0, "y": 90.0},
                "lowerRightCoordinate": {"x": 180.0, "y": -90.0}
            },
            "resolution": {"x": 0.1, "y": 0.1},
            "bands": [{"name": "ndvi", "measurement": {"type": "continuous", "measurement": "NDVI"}}]
        }))
        .unwrap();

        let raster = descriptor.as_raster().unwrap();
        assert_eq!(raster.data_type, RasterDataType::U8);
        assert_eq!(raster.bands.len(), 1);
        assert!(descriptor.as_vector().is_err());
    }

    #[test]
    fn test_schema_mismatch() {
        let descriptor: ResultDescriptor = serde_json::from_value(json!({
            "type": "raster",
            "dataType": "F32",
            "spatialReference": "EPSG:4326",
        }))
        .unwrap();

        let err = descriptor.expect_kind(ResultKind::Vector).unwrap_err();
        assert_eq!(
            err,
            GeoEngineError::SchemaMismatch {
                expected: ResultKind::Vector,
                actual: ResultKind::Raster,
            }
        );
    }

    #[test]
    fn test_classification_columns() {
        let descriptor: VectorResultDescriptor = serde_json::from_value(json!({
            "dataType": "MultiPoint",
            "spatialReference": "EPSG:4326",
            "columns": {
                "land_cover": {
                    "dataType": "int",
                    "measurement": {
                        "type": "classification",
                        "measurement": "Land Cover",
                        "classes": {"0": "Water", "1": "Forest"}
                    }
                },
                "name": {"dataType": "text", "measurement": {"type": "unitless"}}
            }
        }))
        .unwrap();

        let classified: Vec<_> = descriptor.classification_columns().collect();
        assert_eq!(classified.len(), 1);
        assert_eq!(classified[0].0, "land_cover");
        assert_eq!(classified[0].1.get(&1).map(String::as_str), Some("Forest"));
    }

    #[test]
    fn test_classified_descriptors_through_type_tag() {
        let vector: ResultDescriptor = serde_json::from_value(json!({
            "type": "vector",
            "dataType": "MultiPoint",
            "spatialReference": "EPSG:4326",
            "columns": {
                "land_cover": {
                    "dataType": "int",
                    "measurement": {
                        "type": "classification",
                        "measurement": "Land Cover",
                        "classes": {"1": "Water"}
                    }
                }
            }
        }))
        .unwrap();
        let classified: Vec<_> = vector.as_vector().unwrap().classification_columns().collect();
        assert_eq!(classified[0].1.get(&1).map(String::as_str), Some("Water"));

        let raster_json = json!({
            "type": "raster",
            "dataType": "U8",
            "spatialReference": "EPSG:4326",
            "bands": [{
                "name": "land_cover",
                "measurement": {
                    "type": "classification",
                    "measurement": "Land Cover",
                    "classes": {"0": "Water", "12": "Cropland"}
                }
            }]
        });
        let raster: ResultDescriptor = serde_json::from_value(raster_json.clone()).unwrap();
        match &raster.as_raster().unwrap().bands[0].measurement {
            Measurement::Classification { classes, .. } => {
                assert_eq!(classes.get(&12).map(String::as_str), Some("Cropland"))
            }
            other => panic!("expected a classification, got {:?}", other),
        }

        // codes go back out as string keys
        assert_eq!(serde_json::to_value(&raster).unwrap(), raster_json);
    }

    #[test]
    fn test_non_integer_class_code_is_rejected() {
        let result = serde_json::from_value::<Measurement>(json!({
            "type": "classification",
            "measurement": "Land Cover",
            "classes": {"water": "Water"}
        }));
        assert!(result.is_err());
    }
}

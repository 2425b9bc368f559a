//! Canned server responses for client tests.
//!
//! These mirror what a Geo Engine instance returns so that mock servers can
//! answer with realistic bodies.

use serde_json::{json, Value};

/// Session token handed out by [`session`].
pub const SESSION_TOKEN: &str = "e327d9c3-a4f3-4bd7-a5e1-30b26cae8064";

/// User id of the logged-in user in [`user_session`].
pub const USER_ID: &str = "328ca8d1-15d7-4f59-a989-5d5d72c98744";

/// Id the mock server assigns to registered workflows.
pub const WORKFLOW_ID: &str = "c1b1b4ab-0d2c-5c5e-a5ee-e4c1e7fe2b4c";

/// Id the mock server assigns to uploads.
pub const UPLOAD_ID: &str = "3086f494-d5a4-4b51-a14b-3b29f8bf7bb0";

/// Id the mock server assigns to tasks.
pub const TASK_ID: &str = "a4a29ecb-ab0c-4f8a-b1b7-22e0b9b5d9f1";

/// An anonymous session that stays valid for a long time.
pub fn session() -> Value {
    json!({
        "id": SESSION_TOKEN,
        "user": null,
        "created": "2024-01-01T00:00:00Z",
        "validUntil": "2999-12-31T23:59:59Z",
        "project": null,
        "view": null,
        "roles": ["fd8e87bf-515c-4f36-8da6-1a53702ff102"]
    })
}

/// A logged-in user session that stays valid for a long time.
pub fn user_session() -> Value {
    json!({
        "id": SESSION_TOKEN,
        "user": {
            "id": USER_ID,
            "email": "foo@example.com",
            "realName": "Foo Bar"
        },
        "created": "2024-01-01T00:00:00Z",
        "validUntil": "2999-12-31T23:59:59Z",
        "project": null,
        "view": null,
        "roles": [USER_ID, "4e8081b6-8aa6-4275-af0c-2fa2da557d28"]
    })
}

/// A session whose `validUntil` is already in the past.
pub fn expired_session() -> Value {
    let mut session = session();
    session["validUntil"] = json!("2020-01-01T00:00:00Z");
    session
}

/// `{"error": ..., "message": ...}` body.
pub fn error(kind: &str, message: &str) -> Value {
    json!({ "error": kind, "message": message })
}

/// `{"id": ...}` body.
pub fn id(id: &str) -> Value {
    json!({ "id": id })
}

/// Result descriptor of the `ne_10m_ports` point dataset.
pub fn ports_descriptor() -> Value {
    json!({
        "type": "vector",
        "dataType": "MultiPoint",
        "spatialReference": "EPSG:4326",
        "columns": {
            "name": {"dataType": "text", "measurement": {"type": "unitless"}},
            "natlscale": {"dataType": "float", "measurement": {"type": "unitless"}},
            "scalerank": {"dataType": "int", "measurement": {"type": "unitless"}},
            "featurecla": {"dataType": "text", "measurement": {"type": "unitless"}},
            "website": {"dataType": "text", "measurement": {"type": "unitless"}}
        },
        "time": null,
        "bbox": null
    })
}

/// Raster descriptor of a single band F32 dataset in EPSG:4326.
pub fn raster_descriptor() -> Value {
    json!({
        "type": "raster",
        "dataType": "F32",
        "spatialReference": "EPSG:4326",
        "time": null,
        "bbox": null,
        "resolution": null,
        "bands": [{"name": "band", "measurement": {"type": "unitless"}}]
    })
}

pub fn plot_descriptor() -> Value {
    json!({
        "type": "plot",
        "spatialReference": "EPSG:4326",
        "time": null,
        "bbox": null
    })
}

/// Registered workflow definition for `ne_10m_ports`.
pub fn ports_workflow() -> Value {
    json!({
        "type": "Vector",
        "operator": {
            "type": "OgrSource",
            "params": {"data": "ne_10m_ports"}
        }
    })
}

/// Three ports as the WFS endpoint returns them.
///
/// The first two carry the server's beginning and end of time, the third a
/// concrete instant.
pub fn ports_geojson() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-69.92356, 12.4375]},
                "properties": {
                    "name": "Aruba", "natlscale": 1.0, "scalerank": 8,
                    "featurecla": "Port", "website": null
                },
                "when": {
                    "start": "-262144-01-01T00:00:00+00:00",
                    "end": "+262143-12-31T23:59:59.999+00:00",
                    "type": "Interval"
                }
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-58.95141, -34.15333]},
                "properties": {
                    "name": "Zarate", "natlscale": 5.0, "scalerank": 8,
                    "featurecla": "Port", "website": "www.portzarate.com.ar"
                },
                "when": {
                    "start": "-262144-01-01T00:00:00+00:00",
                    "end": "+262143-12-31T23:59:59.999+00:00",
                    "type": "Interval"
                }
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-59.00495, -34.09889]},
                "properties": {
                    "name": "Campana", "natlscale": 5.0, "scalerank": 8,
                    "featurecla": "Port", "website": null
                },
                "when": {
                    "start": "2014-04-01T12:00:00+00:00",
                    "end": "2014-04-01T12:00:00+00:00",
                    "type": "Interval"
                }
            }
        ]
    })
}

/// WMS exception report for a dataset file that can't be opened.
pub const OGC_EXCEPTION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceExceptionReport version="1.3.0" xmlns="http://www.opengis.net/ogc">
  <ServiceException code="NoApplicableCode">Operator: Could not open gdal dataset for file path "/data/missing.tif"</ServiceException>
</ServiceExceptionReport>"#;

pub fn task_running() -> Value {
    json!({
        "status": "running",
        "pctComplete": "50.00%",
        "estimatedTimeRemaining": "? (± ?)",
        "info": null,
        "timeStarted": "2023-02-16T15:25:45.390Z"
    })
}

pub fn task_completed() -> Value {
    json!({
        "status": "completed",
        "info": {"datasetName": "ndvi_mean"},
        "timeTotal": "00:00:12",
        "timeStarted": "2023-02-16T15:25:45.390Z"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_session_keeps_token() {
        let session = expired_session();
        assert_eq!(session["id"], SESSION_TOKEN);
        assert_eq!(session["validUntil"], "2020-01-01T00:00:00Z");
    }

    #[test]
    fn test_ports_geojson_has_three_points() {
        let features = ports_geojson()["features"].as_array().unwrap().len();
        assert_eq!(features, 3);
    }
}

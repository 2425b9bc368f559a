//! Workflow registration and execution against a mock server.

mod common;

use common::{api_path, connect, mock_workflow, world_query};
use geoengine_client::{register_workflow, register_workflow_json, QueryResult};
use geoengine_common::error::OGC_SERVICE_EXCEPTION;
use geoengine_common::{Colorizer, GeoEngineError, RasterColorizer, ResultKind, Rgba};
use geoengine_protocol::{Operator, Workflow};
use httpmock::prelude::*;
use serde_json::json;
use test_utils::assert_approx_eq;
use test_utils::fixtures;
use test_utils::generators::{solid_png, GeoTiffBuilder};

fn workflow_path(suffix: &str) -> String {
    api_path(&format!("{}/{}", suffix, fixtures::WORKFLOW_ID))
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_unknown_type_fails_locally() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    let register = server
        .mock_async(|when, then| {
            when.method(POST).path(api_path("workflow"));
            then.status(200).json_body(fixtures::id(fixtures::WORKFLOW_ID));
        })
        .await;

    let err = register_workflow_json(
        &session,
        json!({"type": "Tabular", "operator": {"type": "OgrSource", "params": {"data": "x"}}}),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, GeoEngineError::InvalidInput(_)), "{:?}", err);
    register.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_register_fetches_result_descriptor() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::ports_descriptor()).await;

    let workflow = Workflow::vector(Operator::ogr_source("ne_10m_ports")).unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();

    assert_eq!(handle.id().to_string(), fixtures::WORKFLOW_ID);
    assert_eq!(handle.kind(), ResultKind::Vector);
    let columns = &handle.get_result_descriptor().as_vector().unwrap().columns;
    assert!(columns.contains_key("natlscale"));
}

#[tokio::test]
async fn test_register_over_classified_raster() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(
        &server,
        json!({
            "type": "raster",
            "dataType": "U8",
            "spatialReference": "EPSG:4326",
            "bands": [{
                "name": "land_cover",
                "measurement": {
                    "type": "classification",
                    "measurement": "Land Cover",
                    "classes": {"0": "Water", "1": "Forest"}
                }
            }]
        }),
    )
    .await;

    let workflow = Workflow::raster(Operator::gdal_source("land_cover")).unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();
    assert_eq!(handle.kind(), ResultKind::Raster);
}

#[tokio::test]
async fn test_stored_definition() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::ports_descriptor()).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(workflow_path("workflow"));
            then.status(200).json_body(fixtures::ports_workflow());
        })
        .await;

    let handle = register_workflow_json(&session, fixtures::ports_workflow())
        .await
        .unwrap();
    let definition = handle.workflow_definition(&session).await.unwrap();
    assert_eq!(definition.operator.name(), "OgrSource");
}

#[tokio::test]
async fn test_provenance_and_metadata_zip() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::ports_descriptor()).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{}/provenance", workflow_path("workflow")));
            then.status(200).json_body(json!([{
                "data": [{"type": "internal", "datasetId": "9c874b9e-cea0-4553-b727-a13cb26ae4bb"}],
                "provenance": {
                    "citation": "Natural Earth",
                    "license": "Public Domain",
                    "uri": "https://www.naturalearthdata.com/"
                }
            }]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{}/allMetadata/zip", workflow_path("workflow")));
            then.status(200)
                .header("content-type", "application/zip")
                .body(b"PK\x05\x06".to_vec());
        })
        .await;

    let handle = register_workflow_json(&session, fixtures::ports_workflow())
        .await
        .unwrap();

    let provenance = handle.get_provenance(&session).await.unwrap();
    assert_eq!(provenance.len(), 1);
    assert_eq!(provenance[0].provenance.license, "Public Domain");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.zip");
    let bytes = handle.metadata_zip(&session, &path).await.unwrap();
    assert_eq!(bytes, 4);
    assert_eq!(std::fs::read(&path).unwrap(), b"PK\x05\x06");
}

// ============================================================================
// Vector
// ============================================================================

#[tokio::test]
async fn test_get_dataframe() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::ports_descriptor()).await;
    let wfs = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(workflow_path("wfs"))
                .query_param("service", "WFS")
                .query_param("request", "GetFeature")
                .query_param("typeNames", fixtures::WORKFLOW_ID)
                .query_param("bbox", "-180.0,-90.0,180.0,90.0");
            then.status(200).json_body(fixtures::ports_geojson());
        })
        .await;

    let handle = register_workflow_json(&session, fixtures::ports_workflow())
        .await
        .unwrap();
    let table = handle
        .get_dataframe(&session, &world_query(0.1), false)
        .await
        .unwrap();

    wfs.assert_async().await;
    assert_eq!(table.len(), 3);
    assert!(table.geometry().iter().all(Option::is_some));

    let names = table.column("name").unwrap().as_text().unwrap();
    assert_eq!(names[1].as_deref(), Some("Zarate"));
    let websites = table.column("website").unwrap().as_text().unwrap();
    assert_eq!(websites[0], None);
    let scale = table.column("natlscale").unwrap().as_float().unwrap();
    assert_approx_eq!(scale[2].unwrap(), 5.0, 1e-9);

    // beginning and end of time have no chrono representation
    assert_eq!(table.start()[0], None);
    assert_eq!(table.end()[0], None);
    assert!(table.start()[2].is_some());
}

#[tokio::test]
async fn test_get_dataframe_on_raster_is_schema_mismatch() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::raster_descriptor()).await;
    let wfs = server
        .mock_async(|when, then| {
            when.method(GET).path(workflow_path("wfs"));
            then.status(200).json_body(fixtures::ports_geojson());
        })
        .await;

    let workflow = Workflow::raster(Operator::gdal_source("ndvi")).unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();
    let err = handle
        .get_dataframe(&session, &world_query(0.1), false)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GeoEngineError::SchemaMismatch {
            expected: ResultKind::Vector,
            actual: ResultKind::Raster,
        }
    );
    wfs.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_deleted_dataset_surfaces_server_message() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::ports_descriptor()).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(workflow_path("wfs"));
            then.status(400).json_body(fixtures::error(
                "UnknownDataId",
                "Unknown data id: ne_10m_ports",
            ));
        })
        .await;

    let handle = register_workflow_json(&session, fixtures::ports_workflow())
        .await
        .unwrap();
    let err = handle
        .get_dataframe(&session, &world_query(0.1), false)
        .await
        .unwrap_err();

    match err {
        GeoEngineError::Server {
            kind,
            message,
            status,
        } => {
            assert_eq!(kind, "UnknownDataId");
            assert_eq!(message, "Unknown data id: ne_10m_ports");
            assert_eq!(status, Some(400));
        }
        other => panic!("expected Server, got {:?}", other),
    }
}

// ============================================================================
// Raster
// ============================================================================

#[tokio::test]
async fn test_wms_exception_report() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::raster_descriptor()).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(workflow_path("wms"))
                .query_param("request", "GetMap");
            then.status(200)
                .header("content-type", "text/xml")
                .body(fixtures::OGC_EXCEPTION_XML);
        })
        .await;

    let workflow = Workflow::raster(Operator::gdal_source("ndvi")).unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();
    let colorizer = RasterColorizer::single_band(
        0,
        Colorizer::linear_with_colors(
            0.0,
            255.0,
            &[Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255])],
        )
        .unwrap(),
    );

    let err = handle
        .wms_get_map(&session, &world_query(1.0), &colorizer)
        .await
        .unwrap_err();

    assert_eq!(err.server_kind(), Some(OGC_SERVICE_EXCEPTION));
    assert!(err.to_string().contains("Could not open gdal dataset"));
}

#[tokio::test]
async fn test_wms_map_as_image() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::raster_descriptor()).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(workflow_path("wms"))
                .query_param("format", "image/png");
            then.status(200)
                .header("content-type", "image/png")
                .body(solid_png(36, 18, [0, 128, 0, 255]));
        })
        .await;

    let workflow = Workflow::raster(Operator::gdal_source("ndvi")).unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();
    let colorizer = RasterColorizer::single_band(
        0,
        Colorizer::linear_with_colors(0.0, 1.0, &[Rgba([0, 0, 0, 255]), Rgba([0, 255, 0, 255])])
            .unwrap(),
    );

    let image = handle
        .wms_get_map_as_image(&session, &world_query(10.0), &colorizer)
        .await
        .unwrap();
    assert_eq!((image.width(), image.height()), (36, 18));
}

#[tokio::test]
async fn test_get_raster() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::raster_descriptor()).await;
    let wcs = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(workflow_path("wcs"))
                .query_param("request", "GetCoverage")
                .query_param("format", "image/tiff");
            then.status(200).body(
                GeoTiffBuilder::new(4, 2)
                    .values(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, -1.0])
                    .origin(-180.0, 90.0)
                    .pixel_size(90.0, 90.0)
                    .no_data(-1.0)
                    .build(),
            );
        })
        .await;

    let workflow = Workflow::raster(Operator::gdal_source("ndvi")).unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();
    let grid = handle
        .get_raster(&session, &world_query(90.0), None)
        .await
        .unwrap();

    wcs.assert_async().await;
    assert_eq!((grid.width(), grid.height()), (4, 2));
    assert_eq!(grid.get(1, 1), Some(6.0));
    assert_eq!(grid.no_data(), Some(-1.0));
    assert_eq!(grid.min_max(), Some((1.0, 7.0)));
}

#[tokio::test]
async fn test_download_raster_tiled() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::raster_descriptor()).await;
    let wcs = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(workflow_path("wcs"))
                .query_param("format", "image/tiff");
            then.status(200).body(GeoTiffBuilder::new(2, 2).build());
        })
        .await;

    let workflow = Workflow::raster(Operator::gdal_source("ndvi")).unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tiles");
    let tiles = handle
        .download_raster_tiled(&session, &world_query(90.0), 2, 2, &out)
        .await
        .unwrap();

    wcs.assert_calls_async(2).await;
    assert_eq!(tiles.len(), 2);
    assert_eq!((tiles[0].row, tiles[0].col), (0, 0));
    assert_eq!((tiles[1].row, tiles[1].col), (0, 1));
    for tile in &tiles {
        assert!(tile.path.exists());
        assert_eq!(std::fs::metadata(&tile.path).unwrap().len(), tile.bytes);
    }
    assert!(out.join("tile_0_1.tif").exists());
}

#[tokio::test]
async fn test_download_raster_exception_writes_nothing() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::raster_descriptor()).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(workflow_path("wcs"));
            then.status(200).body(fixtures::OGC_EXCEPTION_XML);
        })
        .await;

    let workflow = Workflow::raster(Operator::gdal_source("ndvi")).unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ndvi.tif");
    let err = handle
        .download_raster(&session, &world_query(1.0), &path, None)
        .await
        .unwrap_err();

    assert_eq!(err.server_kind(), Some(OGC_SERVICE_EXCEPTION));
    assert!(!path.exists());
}

// ============================================================================
// Plot
// ============================================================================

#[tokio::test]
async fn test_plot_chart() {
    let server = MockServer::start_async().await;
    let session = connect(&server).await;
    mock_workflow(&server, fixtures::plot_descriptor()).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(workflow_path("plot"))
                .query_param("crs", "EPSG:4326");
            then.status(200).json_body(json!({
                "outputFormat": "JsonVega",
                "plotType": "Histogram",
                "data": {
                    "vegaString": "{\"mark\":\"bar\",\"data\":{\"values\":[]}}",
                    "metadata": null
                }
            }));
        })
        .await;

    let workflow = Workflow::plot(Operator::histogram(
        Operator::gdal_source("ndvi"),
        None,
        20,
    ))
    .unwrap();
    let handle = register_workflow(&session, &workflow).await.unwrap();

    let chart = handle.plot_chart(&session, &world_query(1.0)).await.unwrap();
    assert_eq!(chart["mark"], "bar");

    match handle.execute(&session, &world_query(1.0)).await.unwrap() {
        QueryResult::Plot(output) => assert_eq!(output.plot_type, "Histogram"),
        other => panic!("expected a plot, got {:?}", other.kind()),
    }
}

//! Mock server helpers shared by the integration tests.

#![allow(dead_code)]

use geoengine_client::{ClientConfig, Session};
use geoengine_common::time::parse_instant;
use geoengine_common::{BoundingBox2D, QueryRectangle, SpatialResolution, TimeInterval};
use httpmock::prelude::*;
use serde_json::Value;
use test_utils::fixtures;

pub const API: &str = "/api";

pub fn api_path(path: &str) -> String {
    format!("{}/{}", API, path)
}

/// Anonymous session against `server`.
pub async fn connect(server: &MockServer) -> Session {
    server
        .mock_async(|when, then| {
            when.method(POST).path(api_path("anonymous"));
            then.status(200).json_body(fixtures::session());
        })
        .await;

    Session::anonymous(&server.url(API), &ClientConfig::default())
        .await
        .unwrap()
}

/// Mock `POST /workflow` and `GET /workflow/{id}/metadata`.
pub async fn mock_workflow(server: &MockServer, descriptor: Value) {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(api_path("workflow"))
                .header("authorization", format!("Bearer {}", fixtures::SESSION_TOKEN));
            then.status(200).json_body(fixtures::id(fixtures::WORKFLOW_ID));
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(api_path(&format!("workflow/{}/metadata", fixtures::WORKFLOW_ID)));
            then.status(200).json_body(descriptor);
        })
        .await;
}

/// The whole world at one instant.
pub fn world_query(resolution: f64) -> QueryRectangle {
    QueryRectangle::new(
        BoundingBox2D::new(-180.0, -90.0, 180.0, 90.0).unwrap(),
        TimeInterval::instant(parse_instant("2014-04-01T12:00:00Z").unwrap()),
        SpatialResolution::new(resolution, resolution).unwrap(),
    )
    .unwrap()
}

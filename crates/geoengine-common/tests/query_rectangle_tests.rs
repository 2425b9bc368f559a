//! Tests for QueryRectangle validation and its wire format.

use geoengine_common::time::parse_instant;
use geoengine_common::{
    BoundingBox2D, GeoEngineError, QueryRectangle, SpatialReference, SpatialResolution,
    TimeInterval,
};

fn germany() -> BoundingBox2D {
    BoundingBox2D::new(5.85, 47.27, 15.02, 55.07).unwrap()
}

// ============================================================================
// Wire format
// ============================================================================

#[test]
fn test_wire_shape() {
    let t = parse_instant("2014-04-01T12:00:00Z").unwrap();
    let query = QueryRectangle::new(
        germany(),
        TimeInterval::instant(t),
        SpatialResolution::new(1.0, 1.0).unwrap(),
    )
    .unwrap();

    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "spatialBounds": {
                "lowerLeftCoordinate": {"x": 5.85, "y": 47.27},
                "upperRightCoordinate": {"x": 15.02, "y": 55.07}
            },
            "timeInterval": {"start": 1396353600000i64, "end": null},
            "resolution": {"x": 1.0, "y": 1.0},
            "spatialReference": "EPSG:4326"
        })
    );
}

#[test]
fn test_round_trip_preserves_fields() {
    let start = parse_instant("2000-01-01T00:00:00.123Z").unwrap();
    let end = parse_instant("2020-12-31T23:59:59.999Z").unwrap();

    let queries = vec![
        QueryRectangle::new(
            germany(),
            TimeInterval::instant(start),
            SpatialResolution::new(0.1, 0.1).unwrap(),
        )
        .unwrap(),
        QueryRectangle::with_srs(
            BoundingBox2D::new(-20037508.34, -20037508.34, 20037508.34, 20037508.34).unwrap(),
            TimeInterval::new(start, Some(end)).unwrap(),
            SpatialResolution::new(1000.0, 500.0).unwrap(),
            "EPSG:3857".parse::<SpatialReference>().unwrap(),
        )
        .unwrap(),
        // degenerate but valid: zero-area box, instant interval with end == start
        QueryRectangle::new(
            BoundingBox2D::new(1.0, 1.0, 1.0, 1.0).unwrap(),
            TimeInterval::new(start, Some(start)).unwrap(),
            SpatialResolution::new(0.0001, 1e9).unwrap(),
        )
        .unwrap(),
    ];

    for query in queries {
        let json = serde_json::to_string(&query).unwrap();
        let back: QueryRectangle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, query, "round trip changed {}", json);
    }
}

#[test]
fn test_deserialize_rejects_inverted_bounds() {
    let json = serde_json::json!({
        "spatialBounds": {
            "lowerLeftCoordinate": {"x": 10.0, "y": 0.0},
            "upperRightCoordinate": {"x": 0.0, "y": 10.0}
        },
        "timeInterval": {"start": 0, "end": null},
        "resolution": {"x": 1.0, "y": 1.0},
        "spatialReference": "EPSG:4326"
    });
    assert!(serde_json::from_value::<QueryRectangle>(json).is_err());
}

#[test]
fn test_deserialize_rejects_start_after_end() {
    let json = serde_json::json!({
        "spatialBounds": {
            "lowerLeftCoordinate": {"x": 0.0, "y": 0.0},
            "upperRightCoordinate": {"x": 10.0, "y": 10.0}
        },
        "timeInterval": {"start": 1000, "end": 0},
        "resolution": {"x": 1.0, "y": 1.0},
        "spatialReference": "EPSG:4326"
    });
    assert!(serde_json::from_value::<QueryRectangle>(json).is_err());
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_zero_resolution_after_deserialize_fails_validation() {
    let json = serde_json::json!({
        "spatialBounds": {
            "lowerLeftCoordinate": {"x": 0.0, "y": 0.0},
            "upperRightCoordinate": {"x": 10.0, "y": 10.0}
        },
        "timeInterval": {"start": 0, "end": null},
        "resolution": {"x": 0.0, "y": 1.0},
        "spatialReference": "EPSG:4326"
    });
    let query: QueryRectangle = serde_json::from_value(json).unwrap();
    assert!(matches!(
        query.validate(),
        Err(GeoEngineError::InvalidInput(_))
    ));
}

// ============================================================================
// Tiling
// ============================================================================

#[test]
fn test_split_into_tiles_covers_query() {
    let t = parse_instant("2014-04-01T12:00:00Z").unwrap();
    let query = QueryRectangle::new(
        BoundingBox2D::new(0.0, 0.0, 25.0, 10.0).unwrap(),
        TimeInterval::instant(t),
        SpatialResolution::new(1.0, 1.0).unwrap(),
    )
    .unwrap();

    let tiles = query.split_into_tiles(10, 10).unwrap();
    assert_eq!(tiles.len(), 3);

    let (row, col, last) = &tiles[2];
    assert_eq!((*row, *col), (0, 2));
    assert_eq!(last.spatial_bounds().xmin, 20.0);
    assert_eq!(last.spatial_bounds().xmax, 25.0);
    assert_eq!(last.time(), query.time());

    let total_width: f64 = tiles.iter().map(|(_, _, q)| q.spatial_bounds().width()).sum();
    assert_eq!(total_width, 25.0);
}

#[test]
fn test_split_rows_start_at_top() {
    let t = parse_instant("2014-04-01T12:00:00Z").unwrap();
    let query = QueryRectangle::new(
        BoundingBox2D::new(0.0, 0.0, 10.0, 20.0).unwrap(),
        TimeInterval::instant(t),
        SpatialResolution::new(1.0, 1.0).unwrap(),
    )
    .unwrap();

    let tiles = query.split_into_tiles(10, 10).unwrap();
    assert_eq!(tiles.len(), 2);
    assert_eq!(tiles[0].2.spatial_bounds().ymax, 20.0);
    assert_eq!(tiles[1].2.spatial_bounds().ymin, 0.0);
    assert!(query.split_into_tiles(0, 10).is_err());
}

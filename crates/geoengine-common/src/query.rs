//! Query rectangles: the spatial, temporal and resolution extent of a request.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bbox::{BoundingBox2D, SpatialPartition2D};
use crate::crs::SpatialReference;
use crate::error::{GeoEngineError, GeoEngineResult};
use crate::time::TimeInterval;

/// Pixel size along each axis, in units of the spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialResolution {
    pub x: f64,
    pub y: f64,
}

impl SpatialResolution {
    /// Create a resolution, checking both components are finite and positive.
    pub fn new(x: f64, y: f64) -> GeoEngineResult<Self> {
        for (axis, value) in [("x", x), ("y", y)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeoEngineError::InvalidInput(format!(
                    "{} resolution must be positive, got {}",
                    axis, value
                )));
            }
        }
        Ok(Self { x, y })
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl fmt::Display for SpatialResolution {
    /// KVP form `x,y`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?},{:?}", self.x, self.y)
    }
}

/// A query against a workflow: where, when and how fine.
///
/// Wire form is `{spatialBounds, timeInterval, resolution, spatialReference}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRectangle {
    spatial_bounds: BoundingBox2D,
    time_interval: TimeInterval,
    resolution: SpatialResolution,
    spatial_reference: SpatialReference,
}

impl QueryRectangle {
    /// Create a query rectangle in EPSG:4326.
    pub fn new(
        spatial_bounds: BoundingBox2D,
        time_interval: TimeInterval,
        resolution: SpatialResolution,
    ) -> GeoEngineResult<Self> {
        Self::with_srs(
            spatial_bounds,
            time_interval,
            resolution,
            SpatialReference::epsg4326(),
        )
    }

    pub fn with_srs(
        spatial_bounds: BoundingBox2D,
        time_interval: TimeInterval,
        resolution: SpatialResolution,
        spatial_reference: SpatialReference,
    ) -> GeoEngineResult<Self> {
        let query = Self {
            spatial_bounds,
            time_interval,
            resolution,
            spatial_reference,
        };
        query.validate()?;
        Ok(query)
    }

    /// Check the invariants that the constructors guarantee.
    ///
    /// Deserialized values go through the component validators already, but a
    /// resolution can arrive as `{x: 0, y: 0}`, so this re-checks everything.
    pub fn validate(&self) -> GeoEngineResult<()> {
        self.spatial_bounds.validate()?;
        TimeInterval::new(self.time_interval.start(), self.time_interval.end())?;
        SpatialResolution::new(self.resolution.x, self.resolution.y)?;
        Ok(())
    }

    pub fn spatial_bounds(&self) -> &BoundingBox2D {
        &self.spatial_bounds
    }

    pub fn spatial_partition(&self) -> SpatialPartition2D {
        SpatialPartition2D::from(self.spatial_bounds)
    }

    pub fn time(&self) -> &TimeInterval {
        &self.time_interval
    }

    pub fn resolution(&self) -> &SpatialResolution {
        &self.resolution
    }

    pub fn srs(&self) -> &SpatialReference {
        &self.spatial_reference
    }

    /// Bounds as `xmin,ymin,xmax,ymax`.
    pub fn bbox_str(&self) -> String {
        self.spatial_bounds.as_bbox_str(false)
    }

    /// Bounds in the OGC axis order of the spatial reference.
    pub fn bbox_ogc_str(&self) -> String {
        self.spatial_bounds
            .as_bbox_str(self.spatial_reference.is_y_axis_first())
    }

    pub fn bbox_ogc(&self) -> (f64, f64, f64, f64) {
        self.spatial_bounds
            .as_bbox_tuple(self.spatial_reference.is_y_axis_first())
    }

    /// Resolution in the order WCS 1.1.1 expects it.
    ///
    /// For y-first references the axes swap and the first offset is negative.
    pub fn resolution_ogc(&self) -> (f64, f64) {
        if self.spatial_reference.is_y_axis_first() {
            (-self.resolution.y, self.resolution.x)
        } else {
            self.resolution.as_tuple()
        }
    }

    pub fn time_str(&self) -> String {
        self.time_interval.time_str()
    }

    /// Pixel dimensions of the query at its resolution, truncated like the server does.
    pub fn pixel_size(&self) -> (u32, u32) {
        let width = (self.spatial_bounds.width() / self.resolution.x) as u32;
        let height = (self.spatial_bounds.height() / self.resolution.y) as u32;
        (width, height)
    }

    /// The same query with different spatial bounds.
    pub fn with_bounds(&self, spatial_bounds: BoundingBox2D) -> GeoEngineResult<Self> {
        Self::with_srs(
            spatial_bounds,
            self.time_interval,
            self.resolution,
            self.spatial_reference.clone(),
        )
    }

    /// Split into sub-queries covering at most `tile_width` x `tile_height` pixels each.
    pub fn split_into_tiles(
        &self,
        tile_width: u32,
        tile_height: u32,
    ) -> GeoEngineResult<Vec<(usize, usize, QueryRectangle)>> {
        if tile_width == 0 || tile_height == 0 {
            return Err(GeoEngineError::InvalidInput(
                "tile size must be at least one pixel".to_string(),
            ));
        }

        self.spatial_bounds
            .split_into_tiles(
                tile_width as f64 * self.resolution.x,
                tile_height as f64 * self.resolution.y,
            )
            .into_iter()
            .map(|(row, col, bounds)| Ok((row, col, self.with_bounds(bounds)?)))
            .collect()
    }
}

impl fmt::Display for QueryRectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueryRectangle(bbox={}, time={}, resolution={}, srs={})",
            self.bbox_str(),
            self.time_str(),
            self.resolution,
            self.spatial_reference
        )
    }
}

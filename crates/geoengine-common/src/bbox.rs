//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A point in the coordinate space of some spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate2D {
    pub x: f64,
    pub y: f64,
}

impl Coordinate2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A geographic or projected bounding box.
///
/// Serializes as `{lowerLeftCoordinate, upperRightCoordinate}`, the shape the
/// server uses for vector queries and descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "BoundingBox2DWire", try_from = "BoundingBox2DWire")]
pub struct BoundingBox2D {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox2D {
    /// Create a bounding box, checking `xmin <= xmax` and `ymin <= ymax`.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Self, BboxParseError> {
        let bbox = Self {
            xmin,
            ymin,
            xmax,
            ymax,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Create a bounding box without checking its corners.
    pub fn new_unchecked(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn validate(&self) -> Result<(), BboxParseError> {
        let values = [self.xmin, self.ymin, self.xmax, self.ymax];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BboxParseError::NonFinite);
        }
        if self.xmin > self.xmax {
            return Err(BboxParseError::InvertedAxis {
                axis: 'x',
                min: self.xmin,
                max: self.xmax,
            });
        }
        if self.ymin > self.ymax {
            return Err(BboxParseError::InvertedAxis {
                axis: 'y',
                min: self.ymin,
                max: self.ymax,
            });
        }
        Ok(())
    }

    /// Parse a KVP BBOX parameter string: "xmin,ymin,xmax,ymax"
    pub fn from_bbox_str(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }

        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Corners in request order, swapped to `(ymin, xmin, ymax, xmax)` for y-first references.
    pub fn as_bbox_tuple(&self, y_axis_first: bool) -> (f64, f64, f64, f64) {
        if y_axis_first {
            (self.ymin, self.xmin, self.ymax, self.xmax)
        } else {
            (self.xmin, self.ymin, self.xmax, self.ymax)
        }
    }

    /// Comma-separated corners for KVP requests.
    ///
    /// Uses `Debug` float formatting so whole numbers keep their `.0`
    /// (`-60.0,5.0,...`), which is what the OGC endpoints are queried with.
    pub fn as_bbox_str(&self, y_axis_first: bool) -> String {
        let (a, b, c, d) = self.as_bbox_tuple(y_axis_first);
        format!("{:?},{:?},{:?},{:?}", a, b, c, d)
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox2D) -> bool {
        self.xmin < other.xmax
            && self.xmax > other.xmin
            && self.ymin < other.ymax
            && self.ymax > other.ymin
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox2D) -> Option<BoundingBox2D> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox2D {
            xmin: self.xmin.max(other.xmin),
            ymin: self.ymin.max(other.ymin),
            xmax: self.xmax.min(other.xmax),
            ymax: self.ymax.min(other.ymax),
        })
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// Split into a grid of tiles no larger than `tile_width` x `tile_height`.
    ///
    /// Tiles are returned row by row starting at the top-left (`ymax`) corner,
    /// as `(row, col, bbox)`. Edge tiles are clipped to this box.
    pub fn split_into_tiles(&self, tile_width: f64, tile_height: f64) -> Vec<(usize, usize, BoundingBox2D)> {
        if tile_width <= 0.0 || tile_height <= 0.0 || self.width() <= 0.0 || self.height() <= 0.0 {
            return vec![(0, 0, *self)];
        }

        // tolerate float noise so an exact multiple doesn't produce a sliver tile
        let cols = (self.width() / tile_width - 1e-9).ceil().max(1.0) as usize;
        let rows = (self.height() / tile_height - 1e-9).ceil().max(1.0) as usize;

        let mut tiles = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            let ymax = self.ymax - row as f64 * tile_height;
            let ymin = (ymax - tile_height).max(self.ymin);
            for col in 0..cols {
                let xmin = self.xmin + col as f64 * tile_width;
                let xmax = (xmin + tile_width).min(self.xmax);
                tiles.push((row, col, BoundingBox2D::new_unchecked(xmin, ymin, xmax, ymax)));
            }
        }
        tiles
    }
}

/// A bounding box expressed by its upper-left and lower-right corners.
///
/// Raster descriptors and raster query rectangles use this shape on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialPartition2D {
    pub upper_left_coordinate: Coordinate2D,
    pub lower_right_coordinate: Coordinate2D,
}

impl From<BoundingBox2D> for SpatialPartition2D {
    fn from(bbox: BoundingBox2D) -> Self {
        Self {
            upper_left_coordinate: Coordinate2D::new(bbox.xmin, bbox.ymax),
            lower_right_coordinate: Coordinate2D::new(bbox.xmax, bbox.ymin),
        }
    }
}

impl From<SpatialPartition2D> for BoundingBox2D {
    fn from(partition: SpatialPartition2D) -> Self {
        BoundingBox2D::new_unchecked(
            partition.upper_left_coordinate.x,
            partition.lower_right_coordinate.y,
            partition.lower_right_coordinate.x,
            partition.upper_left_coordinate.y,
        )
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingBox2DWire {
    lower_left_coordinate: Coordinate2D,
    upper_right_coordinate: Coordinate2D,
}

impl From<BoundingBox2D> for BoundingBox2DWire {
    fn from(bbox: BoundingBox2D) -> Self {
        Self {
            lower_left_coordinate: Coordinate2D::new(bbox.xmin, bbox.ymin),
            upper_right_coordinate: Coordinate2D::new(bbox.xmax, bbox.ymax),
        }
    }
}

impl TryFrom<BoundingBox2DWire> for BoundingBox2D {
    type Error = BboxParseError;

    fn try_from(wire: BoundingBox2DWire) -> Result<Self, Self::Error> {
        BoundingBox2D::new(
            wire.lower_left_coordinate.x,
            wire.lower_left_coordinate.y,
            wire.upper_right_coordinate.x,
            wire.upper_right_coordinate.y,
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'xmin,ymin,xmax,ymax'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),

    #[error("Invalid BBOX: {axis}min {min} is greater than {axis}max {max}")]
    InvertedAxis { axis: char, min: f64, max: f64 },

    #[error("Invalid BBOX: coordinates must be finite")]
    NonFinite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox2D::from_bbox_str("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.xmin, -125.0);
        assert_eq!(bbox.ymin, 24.0);
        assert_eq!(bbox.xmax, -66.0);
        assert_eq!(bbox.ymax, 50.0);
    }

    #[test]
    fn test_ogc_ordering() {
        let bbox = BoundingBox2D::new(-180.0, -90.0, 180.0, 90.0).unwrap();
        assert_eq!(bbox.as_bbox_str(false), "-180.0,-90.0,180.0,90.0");
        assert_eq!(bbox.as_bbox_str(true), "-90.0,-180.0,90.0,180.0");
    }

    #[test]
    fn test_partition_conversion() {
        let bbox = BoundingBox2D::new(0.0, 10.0, 5.0, 20.0).unwrap();
        let partition = SpatialPartition2D::from(bbox);
        assert_eq!(partition.upper_left_coordinate, Coordinate2D::new(0.0, 20.0));
        assert_eq!(partition.lower_right_coordinate, Coordinate2D::new(5.0, 10.0));
        assert_eq!(BoundingBox2D::from(partition), bbox);
    }

    #[test]
    fn test_inverted_rejected() {
        let err = BoundingBox2D::new(10.0, 0.0, 0.0, 10.0).unwrap_err();
        assert!(matches!(err, BboxParseError::InvertedAxis { axis: 'x', .. }));
    }
}

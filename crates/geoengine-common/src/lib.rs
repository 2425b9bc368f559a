//! Common types and utilities shared across the Geo Engine client crates.

pub mod bbox;
pub mod colorizer;
pub mod crs;
pub mod error;
pub mod ids;
pub mod kind;
pub mod query;
pub mod time;

pub use bbox::{BoundingBox2D, Coordinate2D, SpatialPartition2D};
pub use colorizer::{Breakpoint, Colorizer, RasterColorizer, Rgba};
pub use crs::{AxisOrder, SpatialReference};
pub use error::{GeoEngineError, GeoEngineResult};
pub use ids::{DatasetName, RoleId, SessionToken, TaskId, UploadId, UserId, WorkflowId};
pub use kind::ResultKind;
pub use query::{QueryRectangle, SpatialResolution};
pub use time::{TimeGranularity, TimeInterval, TimeStep};

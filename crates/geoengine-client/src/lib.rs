//! Async client for a Geo Engine server.
//!
//! Start with a [`Session`], register a workflow and query it:
//!
//! ```no_run
//! # async fn run() -> geoengine_common::GeoEngineResult<()> {
//! use geoengine_client::{register_workflow, ClientConfig, Credentials, Session};
//! use geoengine_common::time::parse_instant;
//! use geoengine_common::{BoundingBox2D, QueryRectangle, SpatialResolution, TimeInterval};
//! use geoengine_protocol::{Operator, Workflow};
//!
//! let session = Session::connect(
//!     "http://localhost:3030/api",
//!     Credentials::from_env(),
//!     &ClientConfig::from_env(),
//! )
//! .await?;
//!
//! let workflow = Workflow::vector(Operator::ogr_source("ne_10m_ports"))?;
//! let handle = register_workflow(&session, &workflow).await?;
//!
//! let query = QueryRectangle::new(
//!     BoundingBox2D::new(-180.0, -90.0, 180.0, 90.0)?,
//!     TimeInterval::instant(parse_instant("2014-04-01T12:00:00Z")?),
//!     SpatialResolution::new(0.1, 0.1)?,
//! )?;
//! let ports = handle.get_dataframe(&session, &query, false).await?;
//! println!("{} ports", ports.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod datasets;
mod http;
pub mod permissions;
pub mod quota;
pub mod raster;
pub mod result;
pub mod session;
pub mod tasks;
pub mod vector;
pub mod workflow;

pub use config::{ClientConfig, Credentials};
pub use datasets::{
    add_dataset, add_or_replace_dataset_with_permissions, dataset_info_by_name,
    dataset_metadata_by_name, delete_dataset, list_datasets, list_volumes, upload_dataframe,
    volume_by_name, UploadOptions,
};
pub use permissions::{
    add_permission, add_role, assign_role, remove_permission, remove_role, revoke_role,
};
pub use quota::{data_usage, data_usage_summary, get_quota, update_quota};
pub use raster::{GeoTransform, RasterGrid};
pub use result::QueryResult;
pub use session::{Session, SessionManager};
pub use tasks::{list_tasks, Task};
pub use vector::{ColumnData, FeatureTable};
pub use workflow::{
    fetch_result_descriptor, register_workflow, register_workflow_json, workflow_by_id,
    RasterTile, WorkflowHandle,
};

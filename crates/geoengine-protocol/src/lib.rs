//! Wire types for the Geo Engine API.
//!
//! Covers:
//! - Workflow definitions (typed operator trees with a raw JSON fallback)
//! - Result descriptors, datasets, permissions, quotas, tasks and sessions
//! - OGC WFS 2.0.0, WMS 1.3.0 and WCS 1.1.1 request parameters
//! - GeoJSON feature collections and server error bodies

pub mod dataset;
pub mod descriptor;
pub mod exceptions;
pub mod geojson;
pub mod ogc;
pub mod permissions;
pub mod plot;
pub mod session;
pub mod task;
pub mod workflow;

pub use dataset::{
    AddDatasetProperties, CreateDataset, CreateDatasetResponse, DataId, DataPath, Dataset,
    DatasetDefinition, DatasetFromWorkflow, DatasetListing, DatasetOrder, IdResponse,
    MetaDataDefinition, OgrOnError, OgrSourceColumnSpec, OgrSourceDataset,
    OgrSourceDatasetTimeType, Provenance, ProvenanceEntry, Volume,
};
pub use descriptor::{
    FeatureDataType, Measurement, PlotResultDescriptor, RasterBandDescriptor, RasterDataType,
    RasterResultDescriptor, ResultDescriptor, VectorColumnInfo, VectorDataType,
    VectorResultDescriptor,
};
pub use exceptions::{ErrorResponse, ServiceException};
pub use geojson::{Feature, FeatureCollection, Geometry, When};
pub use ogc::{PlotRequest, WcsGetCoverage, WfsGetFeature, WmsGetMap};
pub use permissions::{
    DataUsage, DataUsageSummary, Permission, PermissionRequest, Quota, Resource,
    UsageSummaryGranularity,
};
pub use plot::PlotOutput;
pub use session::{LoginRequest, UserSession};
pub use task::{TaskFilter, TaskResponse, TaskStatus, TaskStatusWithId};
pub use workflow::{Operator, Workflow, WorkflowError};

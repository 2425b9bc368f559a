//! Permissions, roles and quota types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use geoengine_common::{DatasetName, RoleId, UserId};

/// Something permissions can be granted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum Resource {
    Dataset(DatasetName),
    Layer(String),
    LayerCollection(String),
    Project(Uuid),
    MlModel(String),
}

impl Resource {
    pub fn dataset(name: impl Into<DatasetName>) -> Self {
        Resource::Dataset(name.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Read,
    Owner,
}

/// Body of `PUT /permissions` and `DELETE /permissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub resource: Resource,
    pub role_id: RoleId,
    pub permission: Permission,
}

/// Body of `PUT /roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRole {
    pub name: String,
}

/// Compute quota of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    /// May go negative once exceeded.
    pub available: i64,
    pub used: u64,
}

/// Body of `POST /quotas/{user}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateQuota {
    pub available: i64,
}

/// One computation's use of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataUsage {
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub computation_id: Uuid,
    pub data: String,
    pub count: u64,
}

/// Usage of a dataset aggregated over a time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUsageSummary {
    pub timestamp: DateTime<Utc>,
    pub data: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UsageSummaryGranularity {
    #[default]
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

impl UsageSummaryGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageSummaryGranularity::Minutes => "minutes",
            UsageSummaryGranularity::Hours => "hours",
            UsageSummaryGranularity::Days => "days",
            UsageSummaryGranularity::Months => "months",
            UsageSummaryGranularity::Years => "years",
        }
    }
}

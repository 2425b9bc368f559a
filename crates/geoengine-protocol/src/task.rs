//! Background task status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use geoengine_common::TaskId;

/// `{"taskId": ...}` answers of endpoints that start a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub task_id: TaskId,
}

/// Answer of `GET /tasks/{id}/status`, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TaskStatus {
    #[serde(rename_all = "camelCase")]
    Running {
        /// E.g. "45.00%"
        pct_complete: String,
        estimated_time_remaining: String,
        #[serde(default)]
        info: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_started: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        #[serde(default)]
        info: Value,
        time_total: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_started: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Aborted {
        #[serde(default)]
        clean_up: Value,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        #[serde(default)]
        error: Value,
        #[serde(default)]
        clean_up: Value,
    },
}

impl TaskStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, TaskStatus::Running { .. })
    }

    /// Completed, aborted or failed.
    pub fn is_finished(&self) -> bool {
        !self.is_running()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running { .. } => "running",
            TaskStatus::Completed { .. } => "completed",
            TaskStatus::Aborted { .. } => "aborted",
            TaskStatus::Failed { .. } => "failed",
        }
    }
}

/// One entry of `GET /tasks/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusWithId {
    pub task_id: TaskId,
    #[serde(flatten)]
    pub status: TaskStatus,
}

/// `filter` parameter of `GET /tasks/list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskFilter {
    Running,
    Aborted,
    Failed,
    Completed,
}

impl TaskFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFilter::Running => "running",
            TaskFilter::Aborted => "aborted",
            TaskFilter::Failed => "failed",
            TaskFilter::Completed => "completed",
        }
    }
}

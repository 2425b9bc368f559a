//! Server-side background tasks.

use std::time::Duration;

use reqwest::Method;
use tracing::{debug, info, instrument};

use geoengine_common::{GeoEngineResult, TaskId};
use geoengine_protocol::{TaskFilter, TaskStatus, TaskStatusWithId};

use crate::session::Session;

/// A background task started by an earlier request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Task {
    id: TaskId,
}

impl Task {
    pub fn new(id: TaskId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub async fn status(&self, session: &Session) -> GeoEngineResult<TaskStatus> {
        session
            .get_json(&format!("tasks/{}/status", self.id))
            .await
    }

    /// Ask the server to abort the task. With `force`, clean-up is skipped.
    #[instrument(skip(self, session), fields(task = %self.id))]
    pub async fn abort(&self, session: &Session, force: bool) -> GeoEngineResult<()> {
        let request = session
            .request(Method::GET, &format!("tasks/{}/abort", self.id))?
            .query(&[("force", force)]);
        session.send(request).await?;
        info!("Task abort requested");
        Ok(())
    }

    /// Poll until the task is no longer running and return its final status.
    ///
    /// This never gives up on its own; drop the future to stop waiting.
    #[instrument(skip(self, session), fields(task = %self.id))]
    pub async fn wait_for_finish(
        &self,
        session: &Session,
        check_interval: Duration,
    ) -> GeoEngineResult<TaskStatus> {
        loop {
            let status = self.status(session).await?;
            if status.is_finished() {
                info!(status = status.as_str(), "Task finished");
                return Ok(status);
            }

            if let TaskStatus::Running { pct_complete, .. } = &status {
                debug!(progress = %pct_complete, "Task running");
            }
            tokio::time::sleep(check_interval).await;
        }
    }
}

/// `GET /tasks/list`, optionally filtered by status.
pub async fn list_tasks(
    session: &Session,
    filter: Option<TaskFilter>,
    offset: usize,
    limit: usize,
) -> GeoEngineResult<Vec<(Task, TaskStatus)>> {
    let mut params = vec![("offset", offset.to_string()), ("limit", limit.to_string())];
    if let Some(filter) = filter {
        params.push(("filter", filter.as_str().to_string()));
    }

    let request = session.request(Method::GET, "tasks/list")?.query(&params);
    let tasks: Vec<TaskStatusWithId> = session.send_json(request).await?;

    Ok(tasks
        .into_iter()
        .map(|t| (Task::new(t.task_id), t.status))
        .collect())
}

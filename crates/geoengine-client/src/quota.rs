//! Compute quota and data usage.

use reqwest::Method;
use tracing::{info, instrument};

use geoengine_common::{GeoEngineResult, UserId};
use geoengine_protocol::permissions::UpdateQuota;
use geoengine_protocol::{DataUsage, DataUsageSummary, Quota, UsageSummaryGranularity};

use crate::session::Session;

/// Quota of the session's user, or of `user` (admin only).
pub async fn get_quota(session: &Session, user: Option<UserId>) -> GeoEngineResult<Quota> {
    match user {
        None => session.get_json("quota").await,
        Some(user) => session.get_json(&format!("quotas/{}", user)).await,
    }
}

/// Set a user's available quota. Admin only.
#[instrument(skip(session))]
pub async fn update_quota(session: &Session, user: UserId, available: i64) -> GeoEngineResult<()> {
    let request = session
        .request(Method::POST, &format!("quotas/{}", user))?
        .json(&UpdateQuota { available });
    session.send(request).await?;
    info!("Quota updated");
    Ok(())
}

/// Per-computation data usage of the session's user, newest first.
pub async fn data_usage(
    session: &Session,
    offset: usize,
    limit: usize,
) -> GeoEngineResult<Vec<DataUsage>> {
    let params = [("offset", offset.to_string()), ("limit", limit.to_string())];
    let request = session
        .request(Method::GET, "quota/dataUsage")?
        .query(&params);
    session.send_json(request).await
}

/// Data usage summed per time bucket, optionally for one dataset.
pub async fn data_usage_summary(
    session: &Session,
    granularity: UsageSummaryGranularity,
    dataset: Option<&str>,
    offset: usize,
    limit: usize,
) -> GeoEngineResult<Vec<DataUsageSummary>> {
    let mut params = vec![
        ("granularity", granularity.as_str().to_string()),
        ("offset", offset.to_string()),
        ("limit", limit.to_string()),
    ];
    if let Some(dataset) = dataset {
        params.push(("dataset", dataset.to_string()));
    }

    let request = session
        .request(Method::GET, "quota/dataUsage/summary")?
        .query(&params);
    session.send_json(request).await
}

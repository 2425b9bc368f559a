//! Permissions and roles.

use reqwest::Method;
use tracing::{info, instrument};

use geoengine_common::{GeoEngineResult, RoleId, UserId};
use geoengine_protocol::permissions::AddRole;
use geoengine_protocol::{IdResponse, Permission, PermissionRequest, Resource};

use crate::session::Session;

/// Grant `permission` on `resource` to `role`.
#[instrument(skip(session))]
pub async fn add_permission(
    session: &Session,
    role: RoleId,
    resource: Resource,
    permission: Permission,
) -> GeoEngineResult<()> {
    let body = PermissionRequest {
        resource,
        role_id: role,
        permission,
    };
    let request = session.request(Method::PUT, "permissions")?.json(&body);
    session.send(request).await?;
    info!("Permission added");
    Ok(())
}

#[instrument(skip(session))]
pub async fn remove_permission(
    session: &Session,
    role: RoleId,
    resource: Resource,
    permission: Permission,
) -> GeoEngineResult<()> {
    let body = PermissionRequest {
        resource,
        role_id: role,
        permission,
    };
    let request = session.request(Method::DELETE, "permissions")?.json(&body);
    session.send(request).await?;
    info!("Permission removed");
    Ok(())
}

/// Create a role. Admin only.
#[instrument(skip(session))]
pub async fn add_role(session: &Session, name: &str) -> GeoEngineResult<RoleId> {
    let body = AddRole {
        name: name.to_string(),
    };
    let request = session.request(Method::PUT, "roles")?.json(&body);
    let IdResponse { id } = session.send_json::<IdResponse<RoleId>>(request).await?;
    info!(role = %id, "Role added");
    Ok(id)
}

/// Delete a role. Admin only.
#[instrument(skip(session))]
pub async fn remove_role(session: &Session, role: RoleId) -> GeoEngineResult<()> {
    let request = session.request(Method::DELETE, &format!("roles/{}", role))?;
    session.send(request).await?;
    Ok(())
}

#[instrument(skip(session))]
pub async fn assign_role(session: &Session, role: RoleId, user: UserId) -> GeoEngineResult<()> {
    let request = session.request(Method::POST, &format!("users/{}/roles/{}", user, role))?;
    session.send(request).await?;
    Ok(())
}

#[instrument(skip(session))]
pub async fn revoke_role(session: &Session, role: RoleId, user: UserId) -> GeoEngineResult<()> {
    let request = session.request(Method::DELETE, &format!("users/{}/roles/{}", user, role))?;
    session.send(request).await?;
    Ok(())
}

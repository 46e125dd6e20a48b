use aegis_domain::PermissionKey;
use axum::Json;
use axum::extract::State;

use crate::dto::{PermissionCheckResponse, SessionResponse, UserResponse};
use crate::error::ApiResult;
use crate::extract::ApiPath;
use crate::state::AppState;

use super::AuthenticatedPrincipal;

/// GET /api/auth/me - Current principal with roles and effective permissions.
pub async fn me_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> ApiResult<Json<SessionResponse>> {
    let roles = state.authorization_service.roles_for(principal.id()).await?;
    let permissions = state
        .authorization_service
        .permissions_for(principal.id())
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(SessionResponse {
        user: UserResponse::from(principal),
        roles,
        permissions,
    }))
}

/// GET /api/auth/me/permissions/{permission} - Whether the current principal holds a key.
pub async fn my_permission_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    ApiPath(permission): ApiPath<String>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    let permission = PermissionKey::new(permission)?;
    let granted = state
        .authorization_service
        .has_permission(principal.id(), &permission)
        .await?;

    Ok(Json(PermissionCheckResponse {
        permission: permission.to_string(),
        granted,
    }))
}

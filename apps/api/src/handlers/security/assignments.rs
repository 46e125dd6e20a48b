use super::*;

pub async fn list_role_assignments_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiQuery(query): ApiQuery<RoleAssignmentQuery>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .security_admin_service
        .list_role_assignments(&actor, query.principal_id.map(PrincipalId::new))
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiJson(payload): ApiJson<RoleAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state
        .security_admin_service
        .assign_role(
            &actor,
            PrincipalId::new(payload.principal_id),
            RoleId::new(payload.role_id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("Role assigned"))))
}

pub async fn unassign_role_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiJson(payload): ApiJson<RoleAssignmentRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .security_admin_service
        .unassign_role(
            &actor,
            PrincipalId::new(payload.principal_id),
            RoleId::new(payload.role_id),
        )
        .await?;

    Ok(Json(MessageResponse::new("Role unassigned")))
}

pub async fn user_permissions_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(_actor): AuthenticatedPrincipal,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let principal = state
        .user_service
        .find_principal(PrincipalId::new(user_id))
        .await?;
    let permissions = state
        .authorization_service
        .permissions_for(principal.id())
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(UserPermissionsResponse {
        principal_id: principal.id().as_i64(),
        permissions,
    }))
}

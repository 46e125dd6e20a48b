use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .security_admin_service
        .list_roles(&actor)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiPath(role_id): ApiPath<i64>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .security_admin_service
        .get_role(&actor, RoleId::new(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiJson(payload): ApiJson<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .security_admin_service
        .create_role(
            &actor,
            CreateRoleInput {
                name: NonEmptyString::for_field("name", payload.name)?,
                description: payload.description,
                permissions: parse_permission_keys(payload.permissions)?,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn replace_role_permissions_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiPath(role_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ReplaceRolePermissionsRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .security_admin_service
        .replace_role_permissions(
            &actor,
            RoleId::new(role_id),
            parse_permission_keys(payload.permissions)?,
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiPath(role_id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .security_admin_service
        .delete_role(&actor, RoleId::new(role_id))
        .await?;

    Ok(Json(MessageResponse::new("Role deleted")))
}

use std::collections::BTreeSet;

use aegis_application::CreateRoleInput;
use aegis_core::{AppResult, NonEmptyString, PrincipalId};
use aegis_domain::{PermissionKey, RoleId};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::auth::AuthenticatedPrincipal;
use crate::dto::{
    CreatePermissionRequest, CreateRoleRequest, MessageResponse, PermissionResponse,
    ReplaceRolePermissionsRequest, RoleAssignmentQuery, RoleAssignmentRequest,
    RoleAssignmentResponse, RoleResponse, UserPermissionsResponse,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

mod assignments;
mod permissions;
mod roles;

pub use assignments::{
    assign_role_handler, list_role_assignments_handler, unassign_role_handler,
    user_permissions_handler,
};
pub use permissions::{create_permission_handler, list_permissions_handler};
pub use roles::{
    create_role_handler, delete_role_handler, get_role_handler, list_roles_handler,
    replace_role_permissions_handler,
};

fn parse_permission_keys(values: Vec<String>) -> AppResult<BTreeSet<PermissionKey>> {
    values.into_iter().map(PermissionKey::new).collect()
}

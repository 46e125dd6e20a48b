use aegis_application::RoleAssignment;
use aegis_domain::{PermissionDefinition, RoleDefinition};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub key: String,
    pub label: String,
}

impl From<PermissionDefinition> for PermissionResponse {
    fn from(permission: PermissionDefinition) -> Self {
        Self {
            key: permission.key().to_string(),
            label: permission.label().as_str().to_owned(),
        }
    }
}

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub key: String,
    pub label: String,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
}

impl From<RoleDefinition> for RoleResponse {
    fn from(role: RoleDefinition) -> Self {
        Self {
            id: role.id.as_i64(),
            name: role.name,
            description: role.description,
            permissions: role.permissions.into_iter().map(String::from).collect(),
        }
    }
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    #[ts(optional)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload replacing every grant of a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/replace-role-permissions-request.ts"
)]
pub struct ReplaceRolePermissionsRequest {
    pub permissions: Vec<String>,
}

/// Incoming payload for assigning or unassigning a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-request.ts"
)]
pub struct RoleAssignmentRequest {
    pub principal_id: i64,
    pub role_id: i64,
}

/// Query string filter for assignment listings.
#[derive(Debug, Default, Deserialize)]
pub struct RoleAssignmentQuery {
    pub principal_id: Option<i64>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub principal_id: i64,
    pub role_id: i64,
    pub role_name: String,
    pub assigned_at: String,
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(assignment: RoleAssignment) -> Self {
        Self {
            principal_id: assignment.principal_id.as_i64(),
            role_id: assignment.role_id.as_i64(),
            role_name: assignment.role_name,
            assigned_at: assignment.assigned_at.to_rfc3339(),
        }
    }
}

/// Effective permission set of one principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-permissions-response.ts"
)]
pub struct UserPermissionsResponse {
    pub principal_id: i64,
    pub permissions: Vec<String>,
}

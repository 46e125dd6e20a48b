use std::collections::BTreeSet;

use aegis_core::{AppResult, NonEmptyString, PrincipalId};
use aegis_domain::{PermissionDefinition, PermissionKey, RoleDefinition, RoleId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: NonEmptyString,
    /// Optional description.
    pub description: Option<String>,
    /// Grants to attach to the role.
    pub permissions: BTreeSet<PermissionKey>,
}

/// Assignment projection mapping a principal to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Assigned principal.
    pub principal_id: PrincipalId,
    /// Role identifier.
    pub role_id: RoleId,
    /// Role name.
    pub role_name: String,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}

/// Repository port for permission, role and assignment administration.
#[async_trait]
pub trait SecurityAdminRepository: Send + Sync {
    /// Lists all permissions ordered by key.
    async fn list_permissions(&self) -> AppResult<Vec<PermissionDefinition>>;

    /// Stores a new permission; duplicate keys fail with `Conflict`.
    async fn create_permission(
        &self,
        permission: PermissionDefinition,
    ) -> AppResult<PermissionDefinition>;

    /// Lists all roles with their grants, ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>>;

    /// Finds one role with its grants.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>>;

    /// Creates a role and its grants in one transaction.
    ///
    /// Duplicate names fail with `Conflict`, unknown keys with `NotFound`.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition>;

    /// Replaces every grant of a role atomically.
    ///
    /// Concurrent readers observe either the previous or the new grant set.
    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: BTreeSet<PermissionKey>,
    ) -> AppResult<RoleDefinition>;

    /// Deletes a role and its grants.
    ///
    /// Fails with `DependentsExist` while the role is still assigned.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Assigns a role to a principal; assigning twice is a no-op.
    async fn assign_role(&self, principal_id: PrincipalId, role_id: RoleId) -> AppResult<()>;

    /// Removes an assignment, failing with `NotFound` when absent.
    async fn unassign_role(&self, principal_id: PrincipalId, role_id: RoleId) -> AppResult<()>;

    /// Lists assignments, optionally for a single principal.
    async fn list_role_assignments(
        &self,
        principal_id: Option<PrincipalId>,
    ) -> AppResult<Vec<RoleAssignment>>;
}

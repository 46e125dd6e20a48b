use std::collections::BTreeSet;

use aegis_core::{AppError, PrincipalId};
use aegis_domain::{RoleDefinition, RoleId};

use crate::{CreateRoleInput, RoleAssignment};

use super::*;

impl SecurityAdminService {
    /// Returns every role with its grants.
    pub async fn list_roles(&self, _actor: &Principal) -> AppResult<Vec<RoleDefinition>> {
        self.repository.list_roles().await
    }

    /// Returns one role with its grants.
    pub async fn get_role(&self, _actor: &Principal, role_id: RoleId) -> AppResult<RoleDefinition> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| role_not_found(role_id))
    }

    /// Creates a role with its initial grants.
    pub async fn create_role(
        &self,
        actor: &Principal,
        mut input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        input.description = input
            .description
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let role = self.repository.create_role(input).await?;

        info!(
            actor = %actor.id(),
            role_id = %role.id,
            role = %role.name,
            grants = role.permissions.len(),
            "created role"
        );
        Ok(role)
    }

    /// Replaces the complete grant set of a role in one atomic step.
    pub async fn replace_role_permissions(
        &self,
        actor: &Principal,
        role_id: RoleId,
        permissions: BTreeSet<PermissionKey>,
    ) -> AppResult<RoleDefinition> {
        let role = self
            .repository
            .replace_role_permissions(role_id, permissions)
            .await?;

        info!(
            actor = %actor.id(),
            role_id = %role.id,
            grants = role.permissions.len(),
            "replaced role permissions"
        );
        Ok(role)
    }

    /// Deletes a role that is no longer assigned to anyone.
    pub async fn delete_role(&self, actor: &Principal, role_id: RoleId) -> AppResult<()> {
        self.repository.delete_role(role_id).await?;

        info!(actor = %actor.id(), %role_id, "deleted role");
        Ok(())
    }

    /// Assigns a role to a principal.
    pub async fn assign_role(
        &self,
        actor: &Principal,
        principal_id: PrincipalId,
        role_id: RoleId,
    ) -> AppResult<()> {
        self.repository.assign_role(principal_id, role_id).await?;

        info!(actor = %actor.id(), %principal_id, %role_id, "assigned role");
        Ok(())
    }

    /// Removes a role assignment from a principal.
    pub async fn unassign_role(
        &self,
        actor: &Principal,
        principal_id: PrincipalId,
        role_id: RoleId,
    ) -> AppResult<()> {
        self.repository.unassign_role(principal_id, role_id).await?;

        info!(actor = %actor.id(), %principal_id, %role_id, "removed role assignment");
        Ok(())
    }

    /// Lists role assignments, optionally filtered to one principal.
    pub async fn list_role_assignments(
        &self,
        _actor: &Principal,
        principal_id: Option<PrincipalId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.repository.list_role_assignments(principal_id).await
    }
}

fn role_not_found(role_id: RoleId) -> AppError {
    AppError::NotFound(format!("role '{role_id}' was not found"))
}

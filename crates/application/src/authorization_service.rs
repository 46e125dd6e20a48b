use std::collections::BTreeSet;
use std::sync::Arc;

use aegis_core::{AppResult, PrincipalId};
use aegis_domain::PermissionKey;
use async_trait::async_trait;

/// Repository port for role and permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists granted permission keys across every role assigned to the principal.
    ///
    /// The same key may appear once per granting role.
    async fn list_permissions_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PermissionKey>>;

    /// Lists the names of roles assigned to the principal.
    async fn list_role_names_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<String>>;
}

/// Application service resolving effective permissions.
///
/// Every call reads storage; there is no cache, so grant and assignment
/// changes are visible on the next call.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Returns the union of permissions across all roles assigned to the principal.
    pub async fn permissions_for(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<BTreeSet<PermissionKey>> {
        Ok(self
            .repository
            .list_permissions_for_principal(principal_id)
            .await?
            .into_iter()
            .collect())
    }

    /// Returns whether `key` is among the principal's effective permissions.
    pub async fn has_permission(
        &self,
        principal_id: PrincipalId,
        key: &PermissionKey,
    ) -> AppResult<bool> {
        Ok(self.permissions_for(principal_id).await?.contains(key))
    }

    /// Returns the sorted names of roles assigned to the principal.
    pub async fn roles_for(&self, principal_id: PrincipalId) -> AppResult<Vec<String>> {
        let mut names = self
            .repository
            .list_role_names_for_principal(principal_id)
            .await?;
        names.sort();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
mod tests;

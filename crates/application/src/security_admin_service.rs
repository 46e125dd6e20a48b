use std::sync::Arc;

use aegis_core::{AppResult, NonEmptyString, Principal};
use aegis_domain::{PermissionDefinition, PermissionKey};
use tracing::info;

use crate::SecurityAdminRepository;

mod roles;

/// Application service for permission and role administration.
///
/// Callers only need a valid session; permission keys are not enforced here.
#[derive(Clone)]
pub struct SecurityAdminService {
    repository: Arc<dyn SecurityAdminRepository>,
}

impl SecurityAdminService {
    /// Creates a service backed by a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn SecurityAdminRepository>) -> Self {
        Self { repository }
    }

    /// Lists all known permissions.
    pub async fn list_permissions(
        &self,
        _actor: &Principal,
    ) -> AppResult<Vec<PermissionDefinition>> {
        self.repository.list_permissions().await
    }

    /// Registers a new permission key.
    pub async fn create_permission(
        &self,
        actor: &Principal,
        key: &str,
        label: &str,
    ) -> AppResult<PermissionDefinition> {
        let permission = PermissionDefinition::new(
            PermissionKey::new(key)?,
            NonEmptyString::for_field("label", label)?,
        );

        let permission = self.repository.create_permission(permission).await?;

        info!(
            actor = %actor.id(),
            permission = %permission.key(),
            "created permission"
        );
        Ok(permission)
    }
}

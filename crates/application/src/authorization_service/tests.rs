use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use aegis_core::{AppResult, PrincipalId};
use aegis_domain::PermissionKey;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AuthorizationRepository, AuthorizationService};

/// Role grants and assignments kept as plain maps, joined on every call.
#[derive(Default)]
struct FakeAuthorizationRepository {
    grants: Mutex<HashMap<String, Vec<PermissionKey>>>,
    assignments: Mutex<HashMap<PrincipalId, Vec<String>>>,
}

impl FakeAuthorizationRepository {
    async fn grant(&self, role: &str, keys: &[&str]) -> AppResult<()> {
        let keys = keys
            .iter()
            .map(|key| PermissionKey::new(*key))
            .collect::<AppResult<Vec<_>>>()?;
        self.grants
            .lock()
            .await
            .entry(role.to_owned())
            .or_default()
            .extend(keys);
        Ok(())
    }

    async fn assign(&self, principal_id: PrincipalId, role: &str) {
        self.assignments
            .lock()
            .await
            .entry(principal_id)
            .or_default()
            .push(role.to_owned());
    }

    async fn unassign(&self, principal_id: PrincipalId, role: &str) {
        if let Some(roles) = self.assignments.lock().await.get_mut(&principal_id) {
            roles.retain(|value| value != role);
        }
    }
}

#[async_trait]
impl AuthorizationRepository for FakeAuthorizationRepository {
    async fn list_permissions_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PermissionKey>> {
        let assignments = self.assignments.lock().await;
        let grants = self.grants.lock().await;

        Ok(assignments
            .get(&principal_id)
            .into_iter()
            .flatten()
            .flat_map(|role| grants.get(role).cloned().unwrap_or_default())
            .collect())
    }

    async fn list_role_names_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<String>> {
        Ok(self
            .assignments
            .lock()
            .await
            .get(&principal_id)
            .cloned()
            .unwrap_or_default())
    }
}

fn keys(values: &[&str]) -> AppResult<BTreeSet<PermissionKey>> {
    values.iter().map(|value| PermissionKey::new(*value)).collect()
}

#[tokio::test]
async fn overlapping_roles_collapse_into_one_set() -> AppResult<()> {
    let repository = Arc::new(FakeAuthorizationRepository::default());
    repository.grant("Auditor", &["risk.read", "audit.read"]).await?;
    repository.grant("Viewer", &["risk.read"]).await?;
    let principal_id = PrincipalId::new(7);
    repository.assign(principal_id, "Auditor").await;
    repository.assign(principal_id, "Viewer").await;
    let service = AuthorizationService::new(repository);

    let permissions = service.permissions_for(principal_id).await?;

    assert_eq!(permissions.len(), 2);
    assert_eq!(permissions, keys(&["risk.read", "audit.read"])?);
    Ok(())
}

#[tokio::test]
async fn grant_and_assignment_changes_apply_on_next_call() -> AppResult<()> {
    let repository = Arc::new(FakeAuthorizationRepository::default());
    repository.grant("Manager", &["users.read"]).await?;
    repository.grant("Auditor", &["audit.read"]).await?;
    let principal_id = PrincipalId::new(3);
    repository.assign(principal_id, "Manager").await;
    repository.assign(principal_id, "Auditor").await;
    let service = AuthorizationService::new(repository.clone());

    assert_eq!(
        service.permissions_for(principal_id).await?,
        keys(&["users.read", "audit.read"])?
    );

    repository.grant("Manager", &["users.create"]).await?;
    assert_eq!(
        service.permissions_for(principal_id).await?,
        keys(&["users.read", "users.create", "audit.read"])?
    );

    repository.unassign(principal_id, "Auditor").await;
    assert_eq!(
        service.permissions_for(principal_id).await?,
        keys(&["users.read", "users.create"])?
    );
    Ok(())
}

#[tokio::test]
async fn has_permission_checks_membership() -> AppResult<()> {
    let repository = Arc::new(FakeAuthorizationRepository::default());
    repository.grant("Viewer", &["risk.read"]).await?;
    let principal_id = PrincipalId::new(11);
    repository.assign(principal_id, "Viewer").await;
    let service = AuthorizationService::new(repository);

    assert!(service
        .has_permission(principal_id, &PermissionKey::new("risk.read")?)
        .await?);
    assert!(!service
        .has_permission(principal_id, &PermissionKey::new("risk.delete")?)
        .await?);
    assert!(!service
        .has_permission(PrincipalId::new(12), &PermissionKey::new("risk.read")?)
        .await?);
    Ok(())
}

#[tokio::test]
async fn roles_are_sorted_and_unique() -> AppResult<()> {
    let repository = Arc::new(FakeAuthorizationRepository::default());
    let principal_id = PrincipalId::new(5);
    repository.assign(principal_id, "Viewer").await;
    repository.assign(principal_id, "Administrator").await;
    repository.assign(principal_id, "Viewer").await;
    let service = AuthorizationService::new(repository);

    assert_eq!(
        service.roles_for(principal_id).await?,
        vec!["Administrator".to_owned(), "Viewer".to_owned()]
    );
    Ok(())
}

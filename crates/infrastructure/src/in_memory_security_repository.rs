use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use aegis_application::{
    AuthorizationRepository, CreateRoleInput, NewUser, RoleAssignment, SecurityAdminRepository,
    UserCredentials, UserRepository,
};
use aegis_core::{AppError, AppResult, Principal, PrincipalId};
use aegis_domain::{EmailAddress, PermissionDefinition, PermissionKey, RoleDefinition, RoleId};

/// In-memory users, permissions, roles and assignments.
///
/// All state sits behind one lock so grant replacement is observed atomically
/// by concurrent permission lookups.
#[derive(Debug)]
pub struct InMemorySecurityRepository {
    state: RwLock<SecurityState>,
}

#[derive(Debug, Default)]
struct SecurityState {
    next_user_id: i64,
    users: BTreeMap<PrincipalId, UserCredentials>,
    permissions: BTreeMap<PermissionKey, PermissionDefinition>,
    next_role_id: i64,
    roles: BTreeMap<RoleId, StoredRole>,
    assignments: BTreeMap<(PrincipalId, RoleId), DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct StoredRole {
    name: String,
    description: Option<String>,
    permissions: BTreeSet<PermissionKey>,
}

impl StoredRole {
    fn to_definition(&self, role_id: RoleId) -> RoleDefinition {
        RoleDefinition {
            id: role_id,
            name: self.name.clone(),
            description: self.description.clone(),
            permissions: self.permissions.iter().cloned().collect(),
        }
    }
}

impl SecurityState {
    fn ensure_permissions_exist(&self, permissions: &BTreeSet<PermissionKey>) -> AppResult<()> {
        let missing = permissions
            .iter()
            .filter(|key| !self.permissions.contains_key(*key))
            .map(PermissionKey::as_str)
            .collect::<Vec<_>>();

        if missing.is_empty() {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "unknown permission keys: {}",
            missing.join(", ")
        )))
    }
}

impl InMemorySecurityRepository {
    /// Creates a repository seeded with the default permission catalog.
    #[must_use]
    pub fn new() -> Self {
        let permissions = PermissionDefinition::default_catalog()
            .unwrap_or_default()
            .into_iter()
            .map(|permission| (permission.key().clone(), permission))
            .collect();

        Self {
            state: RwLock::new(SecurityState {
                permissions,
                ..SecurityState::default()
            }),
        }
    }

    /// Removes a user together with its role assignments.
    pub async fn remove_user(&self, principal_id: PrincipalId) -> AppResult<()> {
        let mut state = self.state.write().await;

        if state.users.remove(&principal_id).is_none() {
            return Err(AppError::NotFound(format!(
                "user '{principal_id}' was not found"
            )));
        }
        state
            .assignments
            .retain(|(assigned_principal, _), _| *assigned_principal != principal_id);

        Ok(())
    }
}

impl Default for InMemorySecurityRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemorySecurityRepository {
    async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .get(&principal_id)
            .map(|credentials| credentials.principal.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> AppResult<Option<UserCredentials>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|credentials| credentials.principal.email() == email.as_str())
            .cloned())
    }

    async fn create(&self, user: NewUser) -> AppResult<Principal> {
        let mut state = self.state.write().await;

        if state
            .users
            .values()
            .any(|credentials| credentials.principal.email() == user.email.as_str())
        {
            return Err(AppError::Conflict("email is already registered".to_owned()));
        }

        state.next_user_id += 1;
        let principal = Principal::new(
            PrincipalId::new(state.next_user_id),
            user.email.as_str(),
            user.display_name,
        );
        state.users.insert(
            principal.id(),
            UserCredentials {
                principal: principal.clone(),
                password_hash: user.password_hash,
            },
        );

        Ok(principal)
    }
}

#[async_trait]
impl AuthorizationRepository for InMemorySecurityRepository {
    async fn list_permissions_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PermissionKey>> {
        let state = self.state.read().await;

        Ok(state
            .assignments
            .keys()
            .filter(|(assigned_principal, _)| *assigned_principal == principal_id)
            .filter_map(|(_, role_id)| state.roles.get(role_id))
            .flat_map(|role| role.permissions.iter().cloned())
            .collect())
    }

    async fn list_role_names_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<String>> {
        let state = self.state.read().await;

        Ok(state
            .assignments
            .keys()
            .filter(|(assigned_principal, _)| *assigned_principal == principal_id)
            .filter_map(|(_, role_id)| state.roles.get(role_id))
            .map(|role| role.name.clone())
            .collect())
    }
}

#[async_trait]
impl SecurityAdminRepository for InMemorySecurityRepository {
    async fn list_permissions(&self) -> AppResult<Vec<PermissionDefinition>> {
        Ok(self
            .state
            .read()
            .await
            .permissions
            .values()
            .cloned()
            .collect())
    }

    async fn create_permission(
        &self,
        permission: PermissionDefinition,
    ) -> AppResult<PermissionDefinition> {
        let mut state = self.state.write().await;

        if state.permissions.contains_key(permission.key()) {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                permission.key()
            )));
        }

        state
            .permissions
            .insert(permission.key().clone(), permission.clone());
        Ok(permission)
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let state = self.state.read().await;

        let mut roles = state
            .roles
            .iter()
            .map(|(role_id, role)| role.to_definition(*role_id))
            .collect::<Vec<_>>();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .get(&role_id)
            .map(|role| role.to_definition(role_id)))
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        let mut state = self.state.write().await;

        if state
            .roles
            .values()
            .any(|role| role.name == input.name.as_str())
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name.as_str()
            )));
        }
        state.ensure_permissions_exist(&input.permissions)?;

        state.next_role_id += 1;
        let role_id = RoleId::new(state.next_role_id);
        let role = StoredRole {
            name: input.name.into(),
            description: input.description,
            permissions: input.permissions,
        };
        let definition = role.to_definition(role_id);
        state.roles.insert(role_id, role);

        Ok(definition)
    }

    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: BTreeSet<PermissionKey>,
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.write().await;
        state.ensure_permissions_exist(&permissions)?;

        let role = state
            .roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        role.permissions = permissions;

        Ok(role.to_definition(role_id))
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.write().await;

        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        let assignments = state
            .assignments
            .keys()
            .filter(|(_, assigned_role)| *assigned_role == role_id)
            .count();
        if assignments > 0 {
            return Err(AppError::DependentsExist {
                message: format!("role '{role_id}' is still assigned"),
                dependents: BTreeMap::from([(
                    "role_assignments".to_owned(),
                    u64::try_from(assignments).unwrap_or(u64::MAX),
                )]),
            });
        }

        state.roles.remove(&role_id);
        Ok(())
    }

    async fn assign_role(&self, principal_id: PrincipalId, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&principal_id) {
            return Err(AppError::NotFound(format!(
                "user '{principal_id}' was not found"
            )));
        }
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        state
            .assignments
            .entry((principal_id, role_id))
            .or_insert_with(Utc::now);
        Ok(())
    }

    async fn unassign_role(&self, principal_id: PrincipalId, role_id: RoleId) -> AppResult<()> {
        self.state
            .write()
            .await
            .assignments
            .remove(&(principal_id, role_id))
            .map(|_| ())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role '{role_id}' is not assigned to user '{principal_id}'"
                ))
            })
    }

    async fn list_role_assignments(
        &self,
        principal_id: Option<PrincipalId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let state = self.state.read().await;

        let mut assignments = state
            .assignments
            .iter()
            .filter(|((assigned_principal, _), _)| {
                principal_id.is_none_or(|principal_id| *assigned_principal == principal_id)
            })
            .filter_map(|((assigned_principal, role_id), assigned_at)| {
                state.roles.get(role_id).map(|role| RoleAssignment {
                    principal_id: *assigned_principal,
                    role_id: *role_id,
                    role_name: role.name.clone(),
                    assigned_at: *assigned_at,
                })
            })
            .collect::<Vec<_>>();
        assignments.sort_by(|left, right| {
            (left.principal_id, left.role_name.as_str())
                .cmp(&(right.principal_id, right.role_name.as_str()))
        });

        Ok(assignments)
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use aegis_application::{CreateRoleInput, RoleAssignment, SecurityAdminRepository};
use aegis_core::{AppError, AppResult, NonEmptyString, PrincipalId};
use aegis_domain::{PermissionDefinition, PermissionKey, RoleDefinition, RoleId};

mod assignments;
mod roles;

/// PostgreSQL-backed repository for permission, role and assignment administration.
#[derive(Clone)]
pub struct PostgresSecurityAdminRepository {
    pool: PgPool,
}

impl PostgresSecurityAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    key: String,
    label: String,
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: i64,
    role_name: String,
    description: Option<String>,
    permission: Option<String>,
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    user_id: i64,
    role_id: i64,
    role_name: String,
    assigned_at: DateTime<Utc>,
}

#[async_trait]
impl SecurityAdminRepository for PostgresSecurityAdminRepository {
    async fn list_permissions(&self) -> AppResult<Vec<PermissionDefinition>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT key, label
            FROM permissions
            ORDER BY key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter().map(permission_from_row).collect()
    }

    async fn create_permission(
        &self,
        permission: PermissionDefinition,
    ) -> AppResult<PermissionDefinition> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (key, label)
            VALUES ($1, $2)
            RETURNING key, label
            "#,
        )
        .bind(permission.key().as_str())
        .bind(permission.label().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!(
                    "permission '{}' already exists",
                    permission.key()
                ));
            }
            AppError::Internal(format!("failed to create permission: {error}"))
        })?;

        permission_from_row(row)
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        self.list_roles_impl().await
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        self.find_role_impl(role_id).await
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        self.create_role_impl(input).await
    }

    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permissions: BTreeSet<PermissionKey>,
    ) -> AppResult<RoleDefinition> {
        self.replace_role_permissions_impl(role_id, permissions)
            .await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        self.delete_role_impl(role_id).await
    }

    async fn assign_role(&self, principal_id: PrincipalId, role_id: RoleId) -> AppResult<()> {
        self.assign_role_impl(principal_id, role_id).await
    }

    async fn unassign_role(&self, principal_id: PrincipalId, role_id: RoleId) -> AppResult<()> {
        self.unassign_role_impl(principal_id, role_id).await
    }

    async fn list_role_assignments(
        &self,
        principal_id: Option<PrincipalId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.list_role_assignments_impl(principal_id).await
    }
}

fn permission_from_row(row: PermissionRow) -> AppResult<PermissionDefinition> {
    let key = PermissionKey::from_str(row.key.as_str()).map_err(|error| {
        AppError::Internal(format!("invalid stored permission '{}': {error}", row.key))
    })?;
    let label = NonEmptyString::new(row.label).map_err(|error| {
        AppError::Internal(format!("invalid stored label for permission '{key}': {error}"))
    })?;

    Ok(PermissionDefinition::new(key, label))
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<RoleDefinition>> {
    let mut by_id: BTreeMap<i64, RoleDefinition> = BTreeMap::new();

    for row in rows {
        let role = by_id.entry(row.role_id).or_insert_with(|| RoleDefinition {
            id: RoleId::new(row.role_id),
            name: row.role_name.clone(),
            description: row.description.clone(),
            permissions: Vec::new(),
        });

        if let Some(permission_value) = row.permission {
            let permission = PermissionKey::from_str(permission_value.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored permission '{permission_value}' for role '{}': {error}",
                    row.role_id
                ))
            })?;

            role.permissions.push(permission);
        }
    }

    let mut roles = by_id.into_values().collect::<Vec<_>>();
    roles.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(roles)
}

/// Resolves permission keys to row ids, failing with `NotFound` for unknown keys.
async fn resolve_permission_ids(
    transaction: &mut Transaction<'_, Postgres>,
    permissions: &BTreeSet<PermissionKey>,
) -> AppResult<Vec<i64>> {
    let keys = permissions
        .iter()
        .map(|key| key.as_str().to_owned())
        .collect::<Vec<_>>();

    let rows = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT id, key
        FROM permissions
        WHERE key = ANY($1)
        "#,
    )
    .bind(&keys)
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to resolve permissions: {error}")))?;

    if rows.len() != keys.len() {
        let known = rows
            .iter()
            .map(|(_, key)| key.as_str())
            .collect::<BTreeSet<_>>();
        let missing = keys
            .iter()
            .filter(|key| !known.contains(key.as_str()))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AppError::NotFound(format!(
            "unknown permission keys: {missing}"
        )));
    }

    Ok(rows.into_iter().map(|(id, _)| id).collect())
}

async fn insert_role_grants(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: i64,
    permission_ids: &[i64],
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1, permission_id
        FROM UNNEST($2::BIGINT[]) AS granted(permission_id)
        ON CONFLICT (role_id, permission_id) DO NOTHING
        "#,
    )
    .bind(role_id)
    .bind(permission_ids)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to persist role grants: {error}")))?;

    Ok(())
}

async fn begin(pool: &PgPool) -> AppResult<Transaction<'static, Postgres>> {
    pool.begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23505"))
}

fn foreign_key_constraint(error: &sqlx::Error) -> Option<&str> {
    match error {
        sqlx::Error::Database(database_error)
            if database_error.code().as_deref() == Some("23503") =>
        {
            database_error.constraint()
        }
        _ => None,
    }
}

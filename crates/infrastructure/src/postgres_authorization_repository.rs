use std::str::FromStr;

use async_trait::async_trait;

use aegis_application::AuthorizationRepository;
use aegis_core::{AppError, AppResult, PrincipalId};
use aegis_domain::PermissionKey;

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for principal permission lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    key: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_permissions_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<PermissionKey>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT permissions.key
            FROM user_roles
            INNER JOIN role_permissions
                ON role_permissions.role_id = user_roles.role_id
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE user_roles.user_id = $1
            ORDER BY permissions.key
            "#,
        )
        .bind(principal_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        rows.into_iter()
            .map(|row| {
                PermissionKey::from_str(row.key.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{}' for principal '{principal_id}': {error}",
                        row.key
                    ))
                })
            })
            .collect()
    }

    async fn list_role_names_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT roles.name
            FROM user_roles
            INNER JOIN roles
                ON roles.id = user_roles.role_id
            WHERE user_roles.user_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(principal_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load assigned roles: {error}")))
    }
}

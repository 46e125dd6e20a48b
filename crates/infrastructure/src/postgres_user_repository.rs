//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use aegis_application::{NewUser, UserCredentials, UserRepository};
use aegis_core::{AppError, AppResult, Principal, PrincipalId};
use aegis_domain::EmailAddress;

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    display_name: String,
}

impl From<UserRow> for Principal {
    fn from(row: UserRow) -> Self {
        Principal::new(PrincipalId::new(row.id), row.email, row.display_name)
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    id: i64,
    email: String,
    display_name: String,
    password_hash: String,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(principal_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by id: {error}")))?;

        Ok(row.map(Principal::from))
    }

    async fn find_credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, email, display_name, password_hash
            FROM users
            WHERE email = $1
            LIMIT 1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        Ok(row.map(|row| UserCredentials {
            principal: Principal::new(PrincipalId::new(row.id), row.email, row.display_name),
            password_hash: row.password_hash,
        }))
    }

    async fn create(&self, user: NewUser) -> AppResult<Principal> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, display_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, display_name
            "#,
        )
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.password_hash.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(email_conflict_or_internal)?;

        Ok(Principal::from(row))
    }
}

fn email_conflict_or_internal(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.is_unique_violation()
    {
        return AppError::Conflict("email is already registered".to_owned());
    }

    AppError::Internal(format!("failed to create user: {error}"))
}

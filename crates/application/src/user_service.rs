//! User management ports and application service.
//!
//! Owns registration and password authentication. Failed logins answer with
//! one generic message whether the email is unknown or the password is wrong.

use std::sync::Arc;

use aegis_core::{AppError, AppResult, Principal, PrincipalId};
use aegis_domain::{EmailAddress, default_display_name, validate_password};
use async_trait::async_trait;
use tracing::info;

/// Message returned for every failed password login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Stored principal together with its password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// Stored principal.
    pub principal: Principal,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// Validated user row to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Canonical email address.
    pub email: EmailAddress,
    /// Display name.
    pub display_name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a principal by identifier.
    async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>>;

    /// Finds a principal and its password hash by email.
    async fn find_credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> AppResult<Option<UserCredentials>>;

    /// Inserts a user, failing with `Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> AppResult<Principal>;
}

/// Port for password hashing operations. Keeps application code free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Parameters for user registration.
#[derive(Debug, Clone)]
pub struct RegisterParams {
    /// Email address for the new account.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Optional display name; defaults to the email local part.
    pub display_name: Option<String>,
}

/// Application service for user registration and authentication.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
        }
    }

    /// Registers a new user with email and password.
    pub async fn register(&self, params: RegisterParams) -> AppResult<Principal> {
        let email = EmailAddress::new(params.email)?;
        validate_password(&params.password)?;

        if self
            .user_repository
            .find_credentials_by_email(&email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "email is already registered".to_owned(),
            ));
        }

        let display_name = params
            .display_name
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_display_name(&email).to_owned());
        let password_hash = self.password_hasher.hash_password(&params.password)?;

        let principal = self
            .user_repository
            .create(NewUser {
                email,
                display_name,
                password_hash,
            })
            .await?;

        info!(principal_id = %principal.id(), "registered user");
        Ok(principal)
    }

    /// Authenticates a user with email and password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Principal> {
        let credentials = match EmailAddress::new(email) {
            Ok(email) => self.user_repository.find_credentials_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(credentials) = credentials else {
            // Unknown emails still cost one hash.
            let _ = self.password_hasher.hash_password(password);
            info!(outcome = "unknown_email", "login attempt failed");
            return Err(invalid_credentials());
        };

        if !self
            .password_hasher
            .verify_password(password, &credentials.password_hash)?
        {
            info!(
                principal_id = %credentials.principal.id(),
                outcome = "invalid_password",
                "login attempt failed"
            );
            return Err(invalid_credentials());
        }

        info!(principal_id = %credentials.principal.id(), "login succeeded");
        Ok(credentials.principal)
    }

    /// Returns a stored principal.
    pub async fn find_principal(&self, principal_id: PrincipalId) -> AppResult<Principal> {
        self.user_repository
            .find_by_id(principal_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{principal_id}' was not found")))
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_owned())
}

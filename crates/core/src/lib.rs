//! Shared primitives for all Rust crates in Aegis.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;
/// Offset pagination arithmetic.
pub mod page;
/// Present/absent wrapper for partial updates.
pub mod patch;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{Principal, PrincipalId, TokenError};
pub use page::{Page, PageRequest};
pub use patch::Patch;

/// Result type used across Aegis crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a validated non-empty string, naming the field in the error.
    pub fn for_field(field: &str, value: impl Into<String>) -> AppResult<Self> {
        Self::new(value).map_err(|_| AppError::Validation(format!("{field} is required")))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Delete blocked because other records still reference the resource.
    #[error("conflict: {message}")]
    DependentsExist {
        /// Human-readable explanation.
        message: String,
        /// Blocking dependent kinds with their row counts.
        dependents: BTreeMap<String, u64>,
    },

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Generic unauthenticated error shared by every session check.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Unauthorized".to_owned())
    }
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        Self::unauthenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString, TokenError};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_trims_value() -> Result<(), AppError> {
        let value = NonEmptyString::new("  Vendor lock-in  ")?;
        assert_eq!(value.as_str(), "Vendor lock-in");
        Ok(())
    }

    #[test]
    fn field_error_names_the_field() {
        let error = NonEmptyString::for_field("title", "");
        assert!(matches!(error, Err(AppError::Validation(message)) if message == "title is required"));
    }

    #[test]
    fn token_errors_collapse_to_unauthorized() {
        for error in [
            TokenError::Expired,
            TokenError::InvalidSignature,
            TokenError::Malformed("bad header".to_owned()),
        ] {
            let converted = AppError::from(error);
            assert!(matches!(converted, AppError::Unauthorized(message) if message == "Unauthorized"));
        }
    }
}

//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod risk;
mod security;
mod user;

pub use risk::{Risk, RiskDraft, RiskId, RiskLevel, RiskScore, RiskStatus, RiskUpdate};
pub use security::{
    DEFAULT_PERMISSION_CATALOG, PermissionDefinition, PermissionKey, RoleDefinition, RoleId,
};
pub use user::{
    EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, default_display_name,
    validate_password,
};

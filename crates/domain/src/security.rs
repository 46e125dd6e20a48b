use std::fmt::{Display, Formatter};
use std::str::FromStr;

use aegis_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Permission keys seeded on first start, with their human labels.
pub const DEFAULT_PERMISSION_CATALOG: &[(&str, &str)] = &[
    ("users.read", "View users"),
    ("users.create", "Create users"),
    ("users.update", "Edit users"),
    ("users.delete", "Delete users"),
    ("roles.read", "View roles"),
    ("roles.manage", "Manage roles and assignments"),
    ("departments.read", "View departments"),
    ("departments.manage", "Manage departments"),
    ("assets.read", "View assets"),
    ("assets.manage", "Manage assets"),
    ("audit.read", "View audits"),
    ("audit.manage", "Manage audits"),
    ("findings.read", "View findings"),
    ("findings.manage", "Manage findings"),
    ("risk.read", "View risks"),
    ("risk.create", "Create risks"),
    ("risk.update", "Edit risks"),
    ("risk.delete", "Delete risks"),
    ("controls.read", "View controls"),
    ("controls.manage", "Manage controls"),
    ("policies.read", "View policies"),
    ("policies.manage", "Manage policies"),
];

/// Atomic capability key such as `users.create`.
///
/// Keys are one or more dot-separated segments of lowercase ASCII letters,
/// digits and underscores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Validates and wraps a permission key.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let value = value.trim();

        let well_formed = !value.is_empty()
            && value.split('.').all(|segment| {
                !segment.is_empty()
                    && segment.bytes().all(|byte| {
                        byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_'
                    })
            });

        if !well_formed {
            return Err(AppError::Validation(format!(
                "invalid permission key '{value}'"
            )));
        }

        Ok(Self(value.to_owned()))
    }

    /// Returns the key as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for PermissionKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.0
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Stored permission with its human label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDefinition {
    key: PermissionKey,
    label: NonEmptyString,
}

impl PermissionDefinition {
    /// Creates a permission definition.
    #[must_use]
    pub fn new(key: PermissionKey, label: NonEmptyString) -> Self {
        Self { key, label }
    }

    /// Returns the capability key.
    #[must_use]
    pub fn key(&self) -> &PermissionKey {
        &self.key
    }

    /// Returns the human label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }

    /// Returns the seeded permission catalog.
    pub fn default_catalog() -> AppResult<Vec<Self>> {
        DEFAULT_PERMISSION_CATALOG
            .iter()
            .map(|(key, label)| Ok(Self::new(PermissionKey::new(*key)?, NonEmptyString::new(*label)?)))
            .collect()
    }
}

/// Stable integer identifier of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(i64);

impl RoleId {
    /// Wraps a raw database identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Named permission bundle together with its current grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Stable role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Granted permission keys, sorted and free of duplicates.
    pub permissions: Vec<PermissionKey>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use super::{DEFAULT_PERMISSION_CATALOG, PermissionDefinition, PermissionKey};

    #[test]
    fn accepts_dotted_lowercase_keys() {
        for value in ["users.create", "risk.read", "audit_log.export", "a1.b2.c3"] {
            assert!(PermissionKey::from_str(value).is_ok(), "{value} should parse");
        }
    }

    #[test]
    fn rejects_malformed_keys() {
        for value in ["", "Users.create", "users..create", ".users", "users.", "users create"] {
            assert!(PermissionKey::from_str(value).is_err(), "{value:?} should fail");
        }
    }

    #[test]
    fn default_catalog_keys_are_unique_and_valid() {
        let catalog = PermissionDefinition::default_catalog();
        assert!(catalog.is_ok());

        let keys: BTreeSet<&str> = DEFAULT_PERMISSION_CATALOG.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys.len(), DEFAULT_PERMISSION_CATALOG.len());
    }
}

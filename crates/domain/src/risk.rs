//! Risk register entries and their scoring rules.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use aegis_core::{AppError, AppResult, NonEmptyString, Patch, PrincipalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable integer identifier of a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskId(i64);

impl RiskId {
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

impl Display for RiskId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Impact or likelihood score on the 1 to 5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Lowest accepted score.
    pub const MIN: u8 = 1;
    /// Highest accepted score.
    pub const MAX: u8 = 5;

    /// Validates a score, naming `field` in the error.
    pub fn new(field: &str, value: i64) -> AppResult<Self> {
        u8::try_from(value)
            .ok()
            .filter(|score| (Self::MIN..=Self::MAX).contains(score))
            .map(Self)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "{field} must be between {} and {}",
                    Self::MIN,
                    Self::MAX
                ))
            })
    }

    /// Returns the raw score.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Lifecycle state of a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RiskStatus {
    /// Identified and not yet treated.
    #[default]
    Open,
    /// Treatment in progress.
    Mitigating,
    /// Formally accepted by its owner.
    Accepted,
    /// No longer relevant.
    Closed,
}

impl RiskStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Mitigating => "mitigating",
            Self::Accepted => "accepted",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for RiskStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "mitigating" => Ok(Self::Mitigating),
            "accepted" => Ok(Self::Accepted),
            "closed" => Ok(Self::Closed),
            _ => Err(AppError::Validation(format!(
                "unknown risk status '{value}'"
            ))),
        }
    }
}

/// Band of a risk rating on the 5x5 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    /// Rating 1 to 4.
    Low,
    /// Rating 5 to 9.
    Medium,
    /// Rating 10 to 16.
    High,
    /// Rating above 16.
    Critical,
}

impl RiskLevel {
    /// Classifies a rating.
    #[must_use]
    pub fn from_rating(rating: u8) -> Self {
        match rating {
            0..=4 => Self::Low,
            5..=9 => Self::Medium,
            10..=16 => Self::High,
            _ => Self::Critical,
        }
    }

    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Validated input for registering a new risk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskDraft {
    /// Unique short code such as `RSK-001`.
    pub code: NonEmptyString,
    /// Short title.
    pub title: NonEmptyString,
    /// Optional long description.
    pub description: Option<String>,
    /// Optional category label.
    pub category: Option<String>,
    /// Optional accountable principal.
    pub owner_id: Option<PrincipalId>,
    /// Impact score.
    pub impact: RiskScore,
    /// Likelihood score.
    pub likelihood: RiskScore,
    /// Initial status.
    pub status: RiskStatus,
}

impl RiskDraft {
    /// Returns `impact × likelihood`.
    #[must_use]
    pub fn rating(&self) -> u8 {
        self.impact.value() * self.likelihood.value()
    }
}

/// Stored risk register entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Risk {
    /// Stable identifier.
    pub id: RiskId,
    /// Unique short code.
    pub code: String,
    /// Short title.
    pub title: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Optional category label.
    pub category: Option<String>,
    /// Optional accountable principal.
    pub owner_id: Option<PrincipalId>,
    /// Impact score.
    pub impact: RiskScore,
    /// Likelihood score.
    pub likelihood: RiskScore,
    /// Lifecycle status.
    pub status: RiskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Risk {
    /// Materializes a draft under a freshly assigned identifier.
    #[must_use]
    pub fn from_draft(id: RiskId, draft: RiskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            code: draft.code.into(),
            title: draft.title.into(),
            description: draft.description,
            category: draft.category,
            owner_id: draft.owner_id,
            impact: draft.impact,
            likelihood: draft.likelihood,
            status: draft.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `impact × likelihood`.
    #[must_use]
    pub fn rating(&self) -> u8 {
        self.impact.value() * self.likelihood.value()
    }

    /// Returns the band of the current rating.
    #[must_use]
    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_rating(self.rating())
    }

    /// Applies a partial update, validating every present field first.
    ///
    /// Nothing is modified when any field fails validation.
    pub fn apply(&mut self, update: RiskUpdate, now: DateTime<Utc>) -> AppResult<()> {
        let code = required(update.code, "code")?
            .map(|value| NonEmptyString::for_field("code", value))
            .transpose()?;
        let title = required(update.title, "title")?
            .map(|value| NonEmptyString::for_field("title", value))
            .transpose()?;
        let impact = required(update.impact, "impact")?
            .map(|value| RiskScore::new("impact", value))
            .transpose()?;
        let likelihood = required(update.likelihood, "likelihood")?
            .map(|value| RiskScore::new("likelihood", value))
            .transpose()?;
        let status = required(update.status, "status")?
            .map(|value| RiskStatus::from_str(value.as_str()))
            .transpose()?;

        if let Some(code) = code {
            self.code = code.into();
        }
        if let Some(title) = title {
            self.title = title.into();
        }
        if let Some(impact) = impact {
            self.impact = impact;
        }
        if let Some(likelihood) = likelihood {
            self.likelihood = likelihood;
        }
        if let Some(status) = status {
            self.status = status;
        }
        blank_as_null(update.description).apply_to(&mut self.description);
        blank_as_null(update.category).apply_to(&mut self.category);
        update.owner_id.apply_to(&mut self.owner_id);
        self.updated_at = now;

        Ok(())
    }
}

/// Partial update of a risk; absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskUpdate {
    /// New code; `null` is rejected.
    pub code: Patch<String>,
    /// New title; `null` is rejected.
    pub title: Patch<String>,
    /// New description; `null` clears it.
    pub description: Patch<String>,
    /// New category; `null` clears it.
    pub category: Patch<String>,
    /// New owner; `null` clears it.
    pub owner_id: Patch<PrincipalId>,
    /// New impact score; `null` is rejected.
    pub impact: Patch<i64>,
    /// New likelihood score; `null` is rejected.
    pub likelihood: Patch<i64>,
    /// New status; `null` is rejected.
    pub status: Patch<String>,
}

fn required<T>(patch: Patch<T>, field: &str) -> AppResult<Option<T>> {
    match patch {
        Patch::Absent => Ok(None),
        Patch::Null => Err(AppError::Validation(format!("{field} cannot be null"))),
        Patch::Value(value) => Ok(Some(value)),
    }
}

fn blank_as_null(patch: Patch<String>) -> Patch<String> {
    match patch {
        Patch::Value(value) if value.trim().is_empty() => Patch::Null,
        other => other.map(|value| value.trim().to_owned()),
    }
}

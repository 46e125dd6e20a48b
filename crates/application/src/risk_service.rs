//! Risk register use-cases.

use std::str::FromStr;
use std::sync::Arc;

use aegis_core::{AppError, AppResult, NonEmptyString, Page, PageRequest, Principal, PrincipalId};
use aegis_domain::{Risk, RiskDraft, RiskId, RiskScore, RiskStatus, RiskUpdate};
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::UserRepository;

/// Filters and pagination for risk listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskListQuery {
    /// Requested page.
    pub page: PageRequest,
    /// Case-insensitive substring matched against code and title.
    pub search: Option<String>,
    /// Exact status filter.
    pub status: Option<RiskStatus>,
}

/// Raw create payload, validated by [`RiskService::create_risk`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRiskInput {
    /// Unique short code.
    pub code: String,
    /// Short title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional category.
    pub category: Option<String>,
    /// Optional owner.
    pub owner_id: Option<PrincipalId>,
    /// Impact score, 1 to 5.
    pub impact: i64,
    /// Likelihood score, 1 to 5.
    pub likelihood: i64,
    /// Optional status, defaults to `open`.
    pub status: Option<String>,
}

/// Repository port for risk persistence.
#[async_trait]
pub trait RiskRepository: Send + Sync {
    /// Lists one page of risks ordered by rating (highest first), then code.
    async fn list_risks(&self, query: &RiskListQuery) -> AppResult<Page<Risk>>;

    /// Finds a risk by identifier.
    async fn find_risk(&self, risk_id: RiskId) -> AppResult<Option<Risk>>;

    /// Inserts a risk; duplicate codes fail with `Conflict`.
    async fn create_risk(&self, draft: RiskDraft) -> AppResult<Risk>;

    /// Overwrites a stored risk; duplicate codes fail with `Conflict`.
    async fn update_risk(&self, risk: &Risk) -> AppResult<Risk>;

    /// Deletes a risk, failing with `NotFound` when absent.
    async fn delete_risk(&self, risk_id: RiskId) -> AppResult<()>;
}

/// Application service for the risk register.
#[derive(Clone)]
pub struct RiskService {
    repository: Arc<dyn RiskRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl RiskService {
    /// Creates a risk service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RiskRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            repository,
            user_repository,
        }
    }

    /// Lists risks.
    pub async fn list_risks(&self, _actor: &Principal, query: RiskListQuery) -> AppResult<Page<Risk>> {
        let query = RiskListQuery {
            search: query
                .search
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            ..query
        };

        self.repository.list_risks(&query).await
    }

    /// Returns one risk.
    pub async fn get_risk(&self, _actor: &Principal, risk_id: RiskId) -> AppResult<Risk> {
        self.repository
            .find_risk(risk_id)
            .await?
            .ok_or_else(|| risk_not_found(risk_id))
    }

    /// Validates and registers a new risk.
    pub async fn create_risk(&self, actor: &Principal, input: CreateRiskInput) -> AppResult<Risk> {
        let draft = RiskDraft {
            code: NonEmptyString::for_field("code", input.code)?,
            title: NonEmptyString::for_field("title", input.title)?,
            description: non_blank(input.description),
            category: non_blank(input.category),
            owner_id: input.owner_id,
            impact: RiskScore::new("impact", input.impact)?,
            likelihood: RiskScore::new("likelihood", input.likelihood)?,
            status: input
                .status
                .as_deref()
                .map(RiskStatus::from_str)
                .transpose()?
                .unwrap_or_default(),
        };
        self.ensure_owner_exists(draft.owner_id).await?;

        let risk = self.repository.create_risk(draft).await?;

        info!(
            actor = %actor.id(),
            risk_id = %risk.id,
            rating = risk.rating(),
            "created risk"
        );
        Ok(risk)
    }

    /// Applies a partial update and recomputes the rating.
    pub async fn update_risk(
        &self,
        actor: &Principal,
        risk_id: RiskId,
        update: RiskUpdate,
    ) -> AppResult<Risk> {
        let mut risk = self.get_risk(actor, risk_id).await?;
        let owner_changed = update.owner_id.is_present();

        risk.apply(update, Utc::now())?;
        if owner_changed {
            self.ensure_owner_exists(risk.owner_id).await?;
        }

        let risk = self.repository.update_risk(&risk).await?;

        info!(
            actor = %actor.id(),
            risk_id = %risk.id,
            rating = risk.rating(),
            "updated risk"
        );
        Ok(risk)
    }

    /// Deletes a risk.
    pub async fn delete_risk(&self, actor: &Principal, risk_id: RiskId) -> AppResult<()> {
        self.repository.delete_risk(risk_id).await?;

        info!(actor = %actor.id(), %risk_id, "deleted risk");
        Ok(())
    }

    async fn ensure_owner_exists(&self, owner_id: Option<PrincipalId>) -> AppResult<()> {
        let Some(owner_id) = owner_id else {
            return Ok(());
        };

        if self.user_repository.find_by_id(owner_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "owner '{owner_id}' does not exist"
            )));
        }

        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn risk_not_found(risk_id: RiskId) -> AppError {
    AppError::NotFound(format!("risk '{risk_id}' was not found"))
}

#[cfg(test)]
mod tests;

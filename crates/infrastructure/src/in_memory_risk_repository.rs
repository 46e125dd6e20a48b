use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use aegis_application::{RiskListQuery, RiskRepository};
use aegis_core::{AppError, AppResult, Page};
use aegis_domain::{Risk, RiskDraft, RiskId};

/// In-memory risk register.
#[derive(Debug, Default)]
pub struct InMemoryRiskRepository {
    state: RwLock<RiskState>,
}

#[derive(Debug, Default)]
struct RiskState {
    next_id: i64,
    risks: BTreeMap<RiskId, Risk>,
}

impl InMemoryRiskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn code_taken(risks: &BTreeMap<RiskId, Risk>, code: &str, except: Option<RiskId>) -> bool {
    risks
        .values()
        .any(|risk| risk.code == code && Some(risk.id) != except)
}

#[async_trait]
impl RiskRepository for InMemoryRiskRepository {
    async fn list_risks(&self, query: &RiskListQuery) -> AppResult<Page<Risk>> {
        let state = self.state.read().await;
        let search = query.search.as_deref().map(str::to_lowercase);

        let mut matching = state
            .risks
            .values()
            .filter(|risk| query.status.is_none_or(|status| risk.status == status))
            .filter(|risk| {
                search.as_deref().is_none_or(|search| {
                    risk.code.to_lowercase().contains(search)
                        || risk.title.to_lowercase().contains(search)
                })
            })
            .cloned()
            .collect::<Vec<_>>();
        matching.sort_by(|left, right| {
            right
                .rating()
                .cmp(&left.rating())
                .then_with(|| left.code.cmp(&right.code))
        });

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
        let per_page = usize::try_from(query.page.per_page()).unwrap_or(usize::MAX);
        let items = matching.into_iter().skip(offset).take(per_page).collect();

        Ok(query.page.into_page(items, total))
    }

    async fn find_risk(&self, risk_id: RiskId) -> AppResult<Option<Risk>> {
        Ok(self.state.read().await.risks.get(&risk_id).cloned())
    }

    async fn create_risk(&self, draft: RiskDraft) -> AppResult<Risk> {
        let mut state = self.state.write().await;

        if code_taken(&state.risks, draft.code.as_str(), None) {
            return Err(AppError::Conflict(format!(
                "risk code '{}' already exists",
                draft.code.as_str()
            )));
        }

        state.next_id += 1;
        let risk = Risk::from_draft(RiskId::new(state.next_id), draft, Utc::now());
        state.risks.insert(risk.id, risk.clone());
        Ok(risk)
    }

    async fn update_risk(&self, risk: &Risk) -> AppResult<Risk> {
        let mut state = self.state.write().await;

        if !state.risks.contains_key(&risk.id) {
            return Err(AppError::NotFound(format!("risk '{}' was not found", risk.id)));
        }
        if code_taken(&state.risks, risk.code.as_str(), Some(risk.id)) {
            return Err(AppError::Conflict(format!(
                "risk code '{}' already exists",
                risk.code
            )));
        }

        state.risks.insert(risk.id, risk.clone());
        Ok(risk.clone())
    }

    async fn delete_risk(&self, risk_id: RiskId) -> AppResult<()> {
        self.state
            .write()
            .await
            .risks
            .remove(&risk_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("risk '{risk_id}' was not found")))
    }
}

#[cfg(test)]
mod tests {
    use aegis_application::{RiskListQuery, RiskRepository};
    use aegis_core::{AppError, AppResult, NonEmptyString, PageRequest};
    use aegis_domain::{RiskDraft, RiskScore, RiskStatus};

    use super::InMemoryRiskRepository;

    fn draft(code: &str, title: &str, impact: i64, likelihood: i64) -> AppResult<RiskDraft> {
        Ok(RiskDraft {
            code: NonEmptyString::new(code)?,
            title: NonEmptyString::new(title)?,
            description: None,
            category: None,
            owner_id: None,
            impact: RiskScore::new("impact", impact)?,
            likelihood: RiskScore::new("likelihood", likelihood)?,
            status: RiskStatus::Open,
        })
    }

    async fn seeded() -> AppResult<InMemoryRiskRepository> {
        let repository = InMemoryRiskRepository::new();
        repository.create_risk(draft("RSK-001", "Vendor outage", 2, 2)?).await?;
        repository.create_risk(draft("RSK-002", "Data breach", 5, 5)?).await?;
        repository.create_risk(draft("RSK-003", "Key person loss", 3, 4)?).await?;
        Ok(repository)
    }

    #[tokio::test]
    async fn list_orders_by_rating_and_paginates() -> AppResult<()> {
        let repository = seeded().await?;

        let page = repository
            .list_risks(&RiskListQuery {
                page: PageRequest::new(Some(2), Some(2)),
                ..RiskListQuery::default()
            })
            .await?;

        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].code, "RSK-001");
        Ok(())
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_code_and_title() -> AppResult<()> {
        let repository = seeded().await?;

        let by_title = repository
            .list_risks(&RiskListQuery {
                search: Some("BREACH".to_owned()),
                ..RiskListQuery::default()
            })
            .await?;
        let by_code = repository
            .list_risks(&RiskListQuery {
                search: Some("rsk-003".to_owned()),
                ..RiskListQuery::default()
            })
            .await?;

        assert_eq!(by_title.total, 1);
        assert_eq!(by_title.items[0].code, "RSK-002");
        assert_eq!(by_code.items[0].title, "Key person loss");
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() -> AppResult<()> {
        let repository = seeded().await?;

        let result = repository
            .create_risk(draft("RSK-001", "Another", 1, 1)?)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        Ok(())
    }
}

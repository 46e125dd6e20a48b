use std::collections::BTreeMap;
use std::sync::Arc;

use aegis_core::{AppError, AppResult, Page, Patch, Principal, PrincipalId};
use aegis_domain::{EmailAddress, Risk, RiskDraft, RiskId, RiskStatus, RiskUpdate};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{NewUser, UserCredentials, UserRepository};

use super::{CreateRiskInput, RiskListQuery, RiskRepository, RiskService};

#[derive(Default)]
struct FakeRiskRepository {
    risks: Mutex<BTreeMap<RiskId, Risk>>,
}

#[async_trait]
impl RiskRepository for FakeRiskRepository {
    async fn list_risks(&self, query: &RiskListQuery) -> AppResult<Page<Risk>> {
        let risks = self.risks.lock().await;
        let matching: Vec<Risk> = risks
            .values()
            .filter(|risk| query.status.is_none_or(|status| risk.status == status))
            .cloned()
            .collect();
        let total = u64::try_from(matching.len()).unwrap_or_default();
        Ok(query.page.into_page(matching, total))
    }

    async fn find_risk(&self, risk_id: RiskId) -> AppResult<Option<Risk>> {
        Ok(self.risks.lock().await.get(&risk_id).cloned())
    }

    async fn create_risk(&self, draft: RiskDraft) -> AppResult<Risk> {
        let mut risks = self.risks.lock().await;
        let id = RiskId::new(i64::try_from(risks.len()).unwrap_or_default() + 1);
        let risk = Risk::from_draft(id, draft, Utc::now());
        risks.insert(id, risk.clone());
        Ok(risk)
    }

    async fn update_risk(&self, risk: &Risk) -> AppResult<Risk> {
        self.risks.lock().await.insert(risk.id, risk.clone());
        Ok(risk.clone())
    }

    async fn delete_risk(&self, risk_id: RiskId) -> AppResult<()> {
        self.risks
            .lock()
            .await
            .remove(&risk_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("risk".to_owned()))
    }
}

struct SingleUserRepository(Principal);

#[async_trait]
impl UserRepository for SingleUserRepository {
    async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok((self.0.id() == principal_id).then(|| self.0.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        _email: &EmailAddress,
    ) -> AppResult<Option<UserCredentials>> {
        Ok(None)
    }

    async fn create(&self, _user: NewUser) -> AppResult<Principal> {
        Err(AppError::Internal("not supported".to_owned()))
    }
}

fn actor() -> Principal {
    Principal::new(PrincipalId::new(7), "owner@corp.example", "Owner")
}

fn service() -> (RiskService, Arc<FakeRiskRepository>) {
    let repository = Arc::new(FakeRiskRepository::default());
    let service = RiskService::new(repository.clone(), Arc::new(SingleUserRepository(actor())));
    (service, repository)
}

fn input(code: &str, impact: i64, likelihood: i64) -> CreateRiskInput {
    CreateRiskInput {
        code: code.to_owned(),
        title: format!("Risk {code}"),
        impact,
        likelihood,
        ..CreateRiskInput::default()
    }
}

#[tokio::test]
async fn create_computes_rating_and_defaults_status() -> AppResult<()> {
    let (service, _) = service();

    let risk = service.create_risk(&actor(), input("RSK-1", 4, 5)).await?;

    assert_eq!(risk.rating(), 20);
    assert_eq!(risk.status, RiskStatus::Open);
    Ok(())
}

#[tokio::test]
async fn create_rejects_out_of_range_scores_before_storage() -> AppResult<()> {
    let (service, repository) = service();

    for (impact, likelihood) in [(0, 3), (6, 3), (3, 0), (3, 6)] {
        let result = service
            .create_risk(&actor(), input("RSK-X", impact, likelihood))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    assert!(repository.risks.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_rejects_missing_title_and_unknown_owner() {
    let (service, _) = service();

    let missing_title = service
        .create_risk(
            &actor(),
            CreateRiskInput {
                title: "  ".to_owned(),
                ..input("RSK-2", 2, 2)
            },
        )
        .await;
    assert!(matches!(missing_title, Err(AppError::Validation(message)) if message == "title is required"));

    let unknown_owner = service
        .create_risk(
            &actor(),
            CreateRiskInput {
                owner_id: Some(PrincipalId::new(404)),
                ..input("RSK-3", 2, 2)
            },
        )
        .await;
    assert!(matches!(unknown_owner, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn update_patches_fields_and_recomputes_rating() -> AppResult<()> {
    let (service, _) = service();
    let created = service
        .create_risk(
            &actor(),
            CreateRiskInput {
                description: Some("initial".to_owned()),
                owner_id: Some(actor().id()),
                ..input("RSK-4", 2, 2)
            },
        )
        .await?;

    let updated = service
        .update_risk(
            &actor(),
            created.id,
            RiskUpdate {
                impact: Patch::Value(5),
                description: Patch::Null,
                status: Patch::Value("mitigating".to_owned()),
                ..RiskUpdate::default()
            },
        )
        .await?;

    assert_eq!(updated.rating(), 10);
    assert_eq!(updated.description, None);
    assert_eq!(updated.owner_id, Some(actor().id()));
    assert_eq!(updated.status, RiskStatus::Mitigating);
    Ok(())
}

#[tokio::test]
async fn update_and_delete_report_missing_risk() {
    let (service, _) = service();

    let update = service
        .update_risk(&actor(), RiskId::new(77), RiskUpdate::default())
        .await;
    assert!(matches!(update, Err(AppError::NotFound(_))));

    let delete = service.delete_risk(&actor(), RiskId::new(77)).await;
    assert!(matches!(delete, Err(AppError::NotFound(_))));
}

use std::str::FromStr;

use aegis_application::{CreateRiskInput, RiskListQuery};
use aegis_core::{PageRequest, PrincipalId};
use aegis_domain::{RiskId, RiskStatus};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::auth::AuthenticatedPrincipal;
use crate::dto::{
    CreateRiskRequest, MessageResponse, RiskListParams, RiskPageResponse, RiskResponse,
    UpdateRiskRequest,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

pub async fn list_risks_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiQuery(params): ApiQuery<RiskListParams>,
) -> ApiResult<Json<RiskPageResponse>> {
    let status = params
        .status
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(RiskStatus::from_str)
        .transpose()?;

    let page = state
        .risk_service
        .list_risks(
            &actor,
            RiskListQuery {
                page: PageRequest::new(params.page, params.per_page),
                search: params.search,
                status,
            },
        )
        .await?;

    Ok(Json(RiskPageResponse::from(page)))
}

pub async fn create_risk_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiJson(payload): ApiJson<CreateRiskRequest>,
) -> ApiResult<(StatusCode, Json<RiskResponse>)> {
    let risk = state
        .risk_service
        .create_risk(
            &actor,
            CreateRiskInput {
                code: payload.code,
                title: payload.title,
                description: payload.description,
                category: payload.category,
                owner_id: payload.owner_id.map(PrincipalId::new),
                impact: payload.impact,
                likelihood: payload.likelihood,
                status: payload.status,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RiskResponse::from(risk))))
}

pub async fn get_risk_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiPath(risk_id): ApiPath<i64>,
) -> ApiResult<Json<RiskResponse>> {
    let risk = state
        .risk_service
        .get_risk(&actor, RiskId::new(risk_id))
        .await?;

    Ok(Json(RiskResponse::from(risk)))
}

pub async fn update_risk_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiPath(risk_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateRiskRequest>,
) -> ApiResult<Json<RiskResponse>> {
    let risk = state
        .risk_service
        .update_risk(&actor, RiskId::new(risk_id), payload.into())
        .await?;

    Ok(Json(RiskResponse::from(risk)))
}

pub async fn delete_risk_handler(
    State(state): State<AppState>,
    AuthenticatedPrincipal(actor): AuthenticatedPrincipal,
    ApiPath(risk_id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .risk_service
        .delete_risk(&actor, RiskId::new(risk_id))
        .await?;

    Ok(Json(MessageResponse::new("Risk deleted")))
}

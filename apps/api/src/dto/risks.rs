use aegis_core::{Page, Patch, PrincipalId};
use aegis_domain::{Risk, RiskUpdate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a risk register entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/risk-response.ts"
)]
pub struct RiskResponse {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub owner_id: Option<i64>,
    pub impact: u8,
    pub likelihood: u8,
    pub rating: u8,
    pub level: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Risk> for RiskResponse {
    fn from(risk: Risk) -> Self {
        Self {
            id: risk.id.as_i64(),
            rating: risk.rating(),
            level: risk.level().as_str().to_owned(),
            status: risk.status.as_str().to_owned(),
            impact: risk.impact.value(),
            likelihood: risk.likelihood.value(),
            owner_id: risk.owner_id.map(|owner_id| owner_id.as_i64()),
            created_at: risk.created_at.to_rfc3339(),
            updated_at: risk.updated_at.to_rfc3339(),
            code: risk.code,
            title: risk.title,
            description: risk.description,
            category: risk.category,
        }
    }
}

/// Pagination metadata of a listing.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/pagination-response.ts"
)]
pub struct PaginationResponse {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of risks.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/risk-page-response.ts"
)]
pub struct RiskPageResponse {
    pub items: Vec<RiskResponse>,
    pub pagination: PaginationResponse,
}

impl From<Page<Risk>> for RiskPageResponse {
    fn from(page: Page<Risk>) -> Self {
        let page = page.map(RiskResponse::from);

        Self {
            pagination: PaginationResponse {
                page: page.page,
                per_page: page.per_page,
                total: page.total,
                total_pages: page.total_pages,
            },
            items: page.items,
        }
    }
}

/// Query string for risk listings.
#[derive(Debug, Default, Deserialize)]
pub struct RiskListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
}

/// Incoming payload for risk creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-risk-request.ts"
)]
pub struct CreateRiskRequest {
    pub code: String,
    pub title: String,
    #[serde(default)]
    #[ts(optional)]
    pub description: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub category: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub owner_id: Option<i64>,
    pub impact: i64,
    pub likelihood: i64,
    #[serde(default)]
    #[ts(optional)]
    pub status: Option<String>,
}

/// Partial risk update: omitted fields stay unchanged, `null` clears.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-risk-request.ts"
)]
pub struct UpdateRiskRequest {
    #[serde(default)]
    #[ts(type = "string | null")]
    pub code: Patch<String>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub title: Patch<String>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub description: Patch<String>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub category: Patch<String>,
    #[serde(default)]
    #[ts(type = "number | null")]
    pub owner_id: Patch<i64>,
    #[serde(default)]
    #[ts(type = "number | null")]
    pub impact: Patch<i64>,
    #[serde(default)]
    #[ts(type = "number | null")]
    pub likelihood: Patch<i64>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub status: Patch<String>,
}

impl From<UpdateRiskRequest> for RiskUpdate {
    fn from(request: UpdateRiskRequest) -> Self {
        Self {
            code: request.code,
            title: request.title,
            description: request.description,
            category: request.category,
            owner_id: request.owner_id.map(PrincipalId::new),
            impact: request.impact,
            likelihood: request.likelihood,
            status: request.status,
        }
    }
}

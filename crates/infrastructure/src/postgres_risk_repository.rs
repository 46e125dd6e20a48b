//! PostgreSQL-backed risk register repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use aegis_application::{RiskListQuery, RiskRepository};
use aegis_core::{AppError, AppResult, Page, PrincipalId};
use aegis_domain::{Risk, RiskDraft, RiskId, RiskScore, RiskStatus};

/// PostgreSQL implementation of the risk repository port.
#[derive(Clone)]
pub struct PostgresRiskRepository {
    pool: PgPool,
}

impl PostgresRiskRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RiskRow {
    id: i64,
    code: String,
    title: String,
    description: Option<String>,
    category: Option<String>,
    owner_id: Option<i64>,
    impact: i16,
    likelihood: i16,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RiskRow> for Risk {
    type Error = AppError;

    fn try_from(row: RiskRow) -> Result<Self, Self::Error> {
        let corrupt =
            |error: AppError| AppError::Internal(format!("invalid stored risk '{}': {error}", row.id));

        Ok(Self {
            id: RiskId::new(row.id),
            impact: RiskScore::new("impact", i64::from(row.impact)).map_err(corrupt)?,
            likelihood: RiskScore::new("likelihood", i64::from(row.likelihood)).map_err(corrupt)?,
            status: RiskStatus::from_str(row.status.as_str()).map_err(corrupt)?,
            code: row.code,
            title: row.title,
            description: row.description,
            category: row.category,
            owner_id: row.owner_id.map(PrincipalId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const RISK_COLUMNS: &str = "id, code, title, description, category, owner_id, impact, likelihood, \
                            status, created_at, updated_at";

#[async_trait]
impl RiskRepository for PostgresRiskRepository {
    async fn list_risks(&self, query: &RiskListQuery) -> AppResult<Page<Risk>> {
        let pattern = query.search.as_deref().map(like_pattern);
        let status = query.status.map(|status| status.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM risks
            WHERE ($1::TEXT IS NULL OR code ILIKE $1 OR title ILIKE $1)
                AND ($2::TEXT IS NULL OR status = $2)
            "#,
        )
        .bind(pattern.as_deref())
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count risks: {error}")))?;

        let rows = sqlx::query_as::<_, RiskRow>(&format!(
            r#"
            SELECT {RISK_COLUMNS}
            FROM risks
            WHERE ($1::TEXT IS NULL OR code ILIKE $1 OR title ILIKE $1)
                AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY impact * likelihood DESC, code
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(pattern.as_deref())
        .bind(status)
        .bind(i64::from(query.page.per_page()))
        .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list risks: {error}")))?;

        let items = rows
            .into_iter()
            .map(Risk::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(query
            .page
            .into_page(items, u64::try_from(total).unwrap_or(0)))
    }

    async fn find_risk(&self, risk_id: RiskId) -> AppResult<Option<Risk>> {
        let row = sqlx::query_as::<_, RiskRow>(&format!(
            r#"
            SELECT {RISK_COLUMNS}
            FROM risks
            WHERE id = $1
            "#
        ))
        .bind(risk_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find risk: {error}")))?;

        row.map(Risk::try_from).transpose()
    }

    async fn create_risk(&self, draft: RiskDraft) -> AppResult<Risk> {
        let row = sqlx::query_as::<_, RiskRow>(&format!(
            r#"
            INSERT INTO risks (code, title, description, category, owner_id, impact, likelihood, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RISK_COLUMNS}
            "#
        ))
        .bind(draft.code.as_str())
        .bind(draft.title.as_str())
        .bind(draft.description.as_deref())
        .bind(draft.category.as_deref())
        .bind(draft.owner_id.map(|owner_id| owner_id.as_i64()))
        .bind(i16::from(draft.impact.value()))
        .bind(i16::from(draft.likelihood.value()))
        .bind(draft.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_write_error(error, draft.code.as_str(), "create risk"))?;

        Risk::try_from(row)
    }

    async fn update_risk(&self, risk: &Risk) -> AppResult<Risk> {
        let row = sqlx::query_as::<_, RiskRow>(&format!(
            r#"
            UPDATE risks
            SET code = $2,
                title = $3,
                description = $4,
                category = $5,
                owner_id = $6,
                impact = $7,
                likelihood = $8,
                status = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING {RISK_COLUMNS}
            "#
        ))
        .bind(risk.id.as_i64())
        .bind(risk.code.as_str())
        .bind(risk.title.as_str())
        .bind(risk.description.as_deref())
        .bind(risk.category.as_deref())
        .bind(risk.owner_id.map(|owner_id| owner_id.as_i64()))
        .bind(i16::from(risk.impact.value()))
        .bind(i16::from(risk.likelihood.value()))
        .bind(risk.status.as_str())
        .bind(risk.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_write_error(error, risk.code.as_str(), "update risk"))?
        .ok_or_else(|| AppError::NotFound(format!("risk '{}' was not found", risk.id)))?;

        Risk::try_from(row)
    }

    async fn delete_risk(&self, risk_id: RiskId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM risks
            WHERE id = $1
            "#,
        )
        .bind(risk_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete risk: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("risk '{risk_id}' was not found")));
        }

        Ok(())
    }
}

/// Wraps a search term for `ILIKE`, escaping its wildcards.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for character in search.chars() {
        if matches!(character, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(character);
    }
    pattern.push('%');
    pattern
}

fn map_write_error(error: sqlx::Error, code: &str, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error {
        match database_error.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!("risk code '{code}' already exists"));
            }
            Some("23503") => {
                return AppError::Validation("owner does not exist".to_owned());
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("vendor"), "%vendor%");
        assert_eq!(like_pattern("100%_off\\"), "%100\\%\\_off\\\\%");
    }
}

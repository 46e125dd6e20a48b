use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    details: Option<BTreeMap<String, u64>>,
}

impl ErrorResponse {
    pub(super) fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub(super) fn with_details(mut self, details: BTreeMap<String, u64>) -> Self {
        self.details = Some(details);
        self
    }
}

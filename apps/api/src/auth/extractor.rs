use aegis_core::Principal;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

use super::cookies::session_token;

/// Principal resolved from the request's session cookie.
///
/// Rejects with `401 {"error":"Unauthorized"}` when the cookie is missing,
/// fails verification, or names a user that no longer exists.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequestParts<AppState> for AuthenticatedPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        let principal = state
            .session_resolver
            .resolve_token(token.as_deref())
            .await?;

        Ok(Self(principal))
    }
}

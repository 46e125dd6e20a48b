use aegis_core::AppError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, info};
use url::form_urlencoded;

use crate::auth::{append_header, clear_session_cookie_header, session_token};
use crate::error::ApiError;
use crate::state::AppState;

/// Paths reachable without a session. Each entry matches itself and any
/// path below it.
pub const PUBLIC_PATH_PREFIXES: &[&str] = &[
    "/login",
    "/register",
    "/logout",
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/logout",
    "/health",
    "/assets",
    "/favicon.ico",
];

/// Whether `path` is one of [`PUBLIC_PATH_PREFIXES`] or lies below one.
/// `/assets-old` does not match `/assets`.
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATH_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Login location for a challenged page request. The original path is
/// carried as a form-encoded `redirect` parameter, except for `/`.
pub fn login_redirect_target(path: &str) -> String {
    if path == "/" {
        return "/login".to_owned();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", path)
        .finish();
    format!("/login?{query}")
}

/// Lets public paths through and requires a valid session everywhere else.
///
/// Page requests without a valid session are redirected to the login page;
/// API requests get a JSON `401`. A rejected cookie is cleared either way.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if is_public_path(&path) {
        return next.run(request).await;
    }

    let token = session_token(request.headers());
    match state
        .session_resolver
        .resolve_token(token.as_deref())
        .await
    {
        Ok(principal) => {
            debug!(principal_id = %principal.id(), %path, "session accepted");
            next.run(request).await
        }
        Err(AppError::Unauthorized(_)) => {
            info!(%path, had_cookie = token.is_some(), "unauthenticated request challenged");
            challenge(&path, token.is_some(), state.cookie_secure)
        }
        Err(error) => ApiError(error).into_response(),
    }
}

fn challenge(path: &str, had_cookie: bool, cookie_secure: bool) -> Response {
    let mut response = if is_api_path(path) {
        ApiError(AppError::unauthenticated()).into_response()
    } else {
        Redirect::temporary(&login_redirect_target(path)).into_response()
    };

    if had_cookie {
        append_header(
            response.headers_mut(),
            clear_session_cookie_header(cookie_secure),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::{is_public_path, login_redirect_target};

    #[test]
    fn public_prefixes_match_on_segment_boundaries() {
        assert!(is_public_path("/login"));
        assert!(is_public_path("/login/reset"));
        assert!(is_public_path("/api/auth/login"));
        assert!(is_public_path("/health"));
        assert!(!is_public_path("/loginx"));
        assert!(!is_public_path("/assets-old"));
        assert!(!is_public_path("/api/auth/me"));
        assert!(!is_public_path("/"));
        assert!(!is_public_path("/risks"));
    }

    #[test]
    fn redirect_target_encodes_original_path() {
        assert_eq!(login_redirect_target("/"), "/login");
        assert_eq!(login_redirect_target("/risks"), "/login?redirect=%2Frisks");
        assert_eq!(
            login_redirect_target("/risks/12/edit"),
            "/login?redirect=%2Frisks%2F12%2Fedit"
        );
    }
}

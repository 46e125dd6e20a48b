use aegis_application::RegisterParams;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Redirect};

use crate::dto::{AuthUserResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

use super::cookies::{clear_session_cookie_header, session_cookie_header};

/// POST /api/auth/register - Create an account with email and password.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthUserResponse>)> {
    let principal = state
        .user_service
        .register(RegisterParams {
            email: payload.email,
            password: payload.password,
            display_name: payload.display_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthUserResponse {
            message: "Registration successful".to_owned(),
            user: UserResponse::from(principal),
        }),
    ))
}

/// POST /api/auth/login - Verify credentials and set the session cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let principal = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;
    let token = state.session_resolver.issue(&principal)?;

    Ok((
        AppendHeaders([session_cookie_header(
            token,
            state.session_resolver.ttl(),
            state.cookie_secure,
        )]),
        Json(AuthUserResponse {
            message: "Login successful".to_owned(),
            user: UserResponse::from(principal),
        }),
    ))
}

/// POST /api/auth/logout - Clear the session cookie.
pub async fn logout_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([clear_session_cookie_header(state.cookie_secure)]),
        Json(MessageResponse::new("Logged out")),
    )
}

/// GET /logout - Clear the session cookie and return to the login page.
pub async fn logout_page_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([clear_session_cookie_header(state.cookie_secure)]),
        Redirect::temporary("/login"),
    )
}

use axum::Router;
use axum::routing::{get, post};

use crate::auth;
use crate::state::AppState;

/// Routes on the guard's public allow-list.
pub(super) fn build_public_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/logout", get(auth::logout_page_handler))
}

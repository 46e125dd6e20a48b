use std::path::Path;

use aegis_core::AppError;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::ApiError;
use crate::state::AppState;

/// Serves the frontend bundle when configured, falling back to `index.html`
/// for client-side routes. Without a bundle every unknown path is a JSON 404.
pub(super) fn build_page_routes(frontend_dir: Option<&Path>) -> Router<AppState> {
    match frontend_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            Router::new().fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => Router::new().fallback(not_found_handler),
    }
}

pub(super) async fn not_found_handler() -> ApiError {
    ApiError(AppError::NotFound("Not found".to_owned()))
}

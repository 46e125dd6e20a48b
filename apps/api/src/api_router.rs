use std::path::Path;

use aegis_core::AppError;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{any, get, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;
mod pages;
mod public_auth;

#[cfg(test)]
mod tests;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    frontend_dir: Option<&Path>,
) -> Result<Router, AppError> {
    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(public_auth::build_public_auth_routes())
        .merge(build_protected_routes())
        .merge(pages::build_page_routes(frontend_dir))
        .layer(from_fn_with_state(app_state.clone(), middleware::route_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}

/// Session-only routes. Every handler re-resolves the caller through
/// `AuthenticatedPrincipal`, independently of the route guard.
fn build_protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route(
            "/api/auth/me/permissions/{permission}",
            get(auth::my_permission_handler),
        )
        .route(
            "/api/permissions",
            get(handlers::security::list_permissions_handler)
                .post(handlers::security::create_permission_handler),
        )
        .route(
            "/api/roles",
            get(handlers::security::list_roles_handler)
                .post(handlers::security::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::security::get_role_handler)
                .delete(handlers::security::delete_role_handler),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            put(handlers::security::replace_role_permissions_handler),
        )
        .route(
            "/api/role-assignments",
            get(handlers::security::list_role_assignments_handler)
                .post(handlers::security::assign_role_handler)
                .delete(handlers::security::unassign_role_handler),
        )
        .route(
            "/api/users/{user_id}/permissions",
            get(handlers::security::user_permissions_handler),
        )
        .route(
            "/api/risks",
            get(handlers::risks::list_risks_handler).post(handlers::risks::create_risk_handler),
        )
        .route(
            "/api/risks/{risk_id}",
            get(handlers::risks::get_risk_handler)
                .patch(handlers::risks::update_risk_handler)
                .delete(handlers::risks::delete_risk_handler),
        )
        .route("/api", any(pages::not_found_handler))
        .route("/api/{*rest}", any(pages::not_found_handler))
}

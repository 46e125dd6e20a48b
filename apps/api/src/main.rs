//! Aegis API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dev_seed;
mod dto;
mod error;
mod extract;
mod handlers;
mod middleware;
mod state;

use aegis_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, StartupMode};
use crate::api_services::RepositorySet;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;
    let pool = api_services::connect_and_migrate(&config.database_url).await?;

    if config.startup_mode == StartupMode::Migrate {
        return Ok(());
    }

    let app_state = api_services::build_app_state(RepositorySet::postgres(&pool), &config);

    if config.startup_mode == StartupMode::Seed {
        return dev_seed::run(&app_state).await;
    }

    let router = api_router::build_router(
        app_state,
        &config.frontend_url,
        config.frontend_dir.as_deref(),
    )?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "aegis-api listening");
    axum::serve(listener, router)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}

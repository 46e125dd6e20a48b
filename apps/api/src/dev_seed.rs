use std::env;

use aegis_application::{CreateRoleInput, RegisterParams};
use aegis_core::{AppError, AppResult, NonEmptyString, Principal};
use aegis_domain::RoleId;
use tracing::info;

use crate::state::AppState;

const DEV_SEED_ADMIN_EMAIL: &str = "admin@aegis.local";
const DEV_SEED_ADMIN_PASSWORD: &str = "change-me-admin";
const DEV_SEED_ADMIN_DISPLAY_NAME: &str = "Administrator";
const DEV_SEED_ADMIN_ROLE: &str = "Administrator";

/// Creates a development administrator holding every catalog permission.
///
/// Safe to run repeatedly: existing users and roles are reused.
pub async fn run(app_state: &AppState) -> AppResult<()> {
    let email = env::var("DEV_ADMIN_EMAIL").unwrap_or_else(|_| DEV_SEED_ADMIN_EMAIL.to_owned());
    let password =
        env::var("DEV_ADMIN_PASSWORD").unwrap_or_else(|_| DEV_SEED_ADMIN_PASSWORD.to_owned());

    let admin = ensure_admin_user(app_state, &email, &password).await?;
    let role_id = ensure_admin_role(app_state, &admin).await?;

    app_state
        .security_admin_service
        .assign_role(&admin, admin.id(), role_id)
        .await?;

    info!(principal_id = %admin.id(), email = %admin.email(), "development seed applied");
    Ok(())
}

async fn ensure_admin_user(
    app_state: &AppState,
    email: &str,
    password: &str,
) -> AppResult<Principal> {
    let registered = app_state
        .user_service
        .register(RegisterParams {
            email: email.to_owned(),
            password: password.to_owned(),
            display_name: Some(DEV_SEED_ADMIN_DISPLAY_NAME.to_owned()),
        })
        .await;

    match registered {
        Ok(principal) => Ok(principal),
        Err(AppError::Conflict(_)) => app_state
            .user_service
            .login(email, password)
            .await
            .map_err(|_| {
                AppError::Validation(format!(
                    "seed user '{email}' exists with a different password"
                ))
            }),
        Err(error) => Err(error),
    }
}

async fn ensure_admin_role(app_state: &AppState, admin: &Principal) -> AppResult<RoleId> {
    let service = &app_state.security_admin_service;
    let permissions = service
        .list_permissions(admin)
        .await?
        .into_iter()
        .map(|permission| permission.key().clone())
        .collect();

    if let Some(role) = service
        .list_roles(admin)
        .await?
        .into_iter()
        .find(|role| role.name == DEV_SEED_ADMIN_ROLE)
    {
        service
            .replace_role_permissions(admin, role.id, permissions)
            .await?;
        return Ok(role.id);
    }

    let role = service
        .create_role(
            admin,
            CreateRoleInput {
                name: NonEmptyString::new(DEV_SEED_ADMIN_ROLE)?,
                description: Some("Full access to every administrative surface".to_owned()),
                permissions,
            },
        )
        .await?;
    Ok(role.id)
}

use std::sync::Arc;

use aegis_application::{
    AuthorizationService, RiskService, SecurityAdminService, SessionResolver, UserService,
};
use aegis_infrastructure::{Argon2PasswordHasher, JwtSessionTokenCodec};

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod repositories;

pub use repositories::RepositorySet;

pub fn build_app_state(repositories: RepositorySet, config: &ApiConfig) -> AppState {
    let token_codec = Arc::new(JwtSessionTokenCodec::new(&config.auth_secret));
    let password_hasher = Arc::new(Argon2PasswordHasher::new());

    AppState {
        user_service: UserService::new(repositories.user_repository.clone(), password_hasher),
        session_resolver: SessionResolver::new(
            token_codec,
            repositories.user_repository.clone(),
            config.session_ttl,
        ),
        authorization_service: AuthorizationService::new(repositories.authorization_repository),
        security_admin_service: SecurityAdminService::new(repositories.security_admin_repository),
        risk_service: RiskService::new(repositories.risk_repository, repositories.user_repository),
        cookie_secure: config.cookie_secure,
    }
}

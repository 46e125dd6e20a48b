use std::sync::Arc;

use aegis_application::{
    AuthorizationRepository, RiskRepository, SecurityAdminRepository, UserRepository,
};
use aegis_infrastructure::{
    PostgresAuthorizationRepository, PostgresRiskRepository, PostgresSecurityAdminRepository,
    PostgresUserRepository,
};
use sqlx::PgPool;

/// Storage ports the application services are wired against.
pub struct RepositorySet {
    pub user_repository: Arc<dyn UserRepository>,
    pub authorization_repository: Arc<dyn AuthorizationRepository>,
    pub security_admin_repository: Arc<dyn SecurityAdminRepository>,
    pub risk_repository: Arc<dyn RiskRepository>,
}

impl RepositorySet {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
            authorization_repository: Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
            security_admin_repository: Arc::new(PostgresSecurityAdminRepository::new(
                pool.clone(),
            )),
            risk_repository: Arc::new(PostgresRiskRepository::new(pool.clone())),
        }
    }
}

use aegis_application::{
    AuthorizationService, RiskService, SecurityAdminService, SessionResolver, UserService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub session_resolver: SessionResolver,
    pub authorization_service: AuthorizationService,
    pub security_admin_service: SecurityAdminService,
    pub risk_service: RiskService,
    pub cookie_secure: bool,
}

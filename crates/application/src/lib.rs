//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod risk_service;
mod security_admin_ports;
mod security_admin_service;
mod session_service;
mod user_service;

pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use risk_service::{CreateRiskInput, RiskListQuery, RiskRepository, RiskService};
pub use security_admin_ports::{CreateRoleInput, RoleAssignment, SecurityAdminRepository};
pub use security_admin_service::SecurityAdminService;
pub use session_service::{SessionResolver, SessionTokenCodec};
pub use user_service::{
    INVALID_CREDENTIALS_MESSAGE, NewUser, PasswordHasher, RegisterParams, UserCredentials,
    UserRepository, UserService,
};

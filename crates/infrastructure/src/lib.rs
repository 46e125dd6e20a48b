//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_risk_repository;
mod in_memory_security_repository;
mod jwt_session_token_codec;
mod postgres_authorization_repository;
mod postgres_risk_repository;
mod postgres_security_admin_repository;
mod postgres_user_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_risk_repository::InMemoryRiskRepository;
pub use in_memory_security_repository::InMemorySecurityRepository;
pub use jwt_session_token_codec::JwtSessionTokenCodec;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_risk_repository::PostgresRiskRepository;
pub use postgres_security_admin_repository::PostgresSecurityAdminRepository;
pub use postgres_user_repository::PostgresUserRepository;

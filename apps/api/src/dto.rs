//! Transport types for the HTTP API, exported to TypeScript with `ts-rs`.

mod auth;
mod common;
mod risks;
mod security;

pub use auth::{
    AuthUserResponse, LoginRequest, PermissionCheckResponse, RegisterRequest, SessionResponse,
    UserResponse,
};
pub use common::{HealthResponse, MessageResponse};
pub use risks::{
    CreateRiskRequest, RiskListParams, RiskPageResponse, RiskResponse, UpdateRiskRequest,
};
pub use security::{
    CreatePermissionRequest, CreateRoleRequest, PermissionResponse, ReplaceRolePermissionsRequest,
    RoleAssignmentQuery, RoleAssignmentRequest, RoleAssignmentResponse, RoleResponse,
    UserPermissionsResponse,
};

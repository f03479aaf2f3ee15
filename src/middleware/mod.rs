pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser, TenantContext};
pub use response::{ApiResponse, ApiResult};

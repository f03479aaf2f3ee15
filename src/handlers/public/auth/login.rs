// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::user::{self, LoginRequest, LoginResponse};

/// POST /auth/login - verify credentials and return a JWT
///
/// The token carries the user's active institute number when one is set, so
/// tenant routes work without another lookup.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let response = user::login(&state.pool, request).await?;
    Ok(ApiResponse::success(response).with_message("Login successful"))
}

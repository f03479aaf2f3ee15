// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::user::{self, RegisterRequest};

/// POST /auth/register - create an account in the shared user catalog
///
/// Input: `{ "username", "email", "password" }`. A duplicate email is a 409.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let user = user::register(&state.pool, request).await?;
    Ok(ApiResponse::created(user).with_message("User registered successfully"))
}

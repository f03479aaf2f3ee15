use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::database::models::Institute;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::server::AppState;
use crate::services::provisioner::{self, NewInstitute, ProvisionedInstitute};

/// POST /api/institute - create an institute and provision its tables
///
/// Returns the institute with a fresh token scoped to the new institute
/// number; the caller should use it for every tenant route that follows.
pub async fn institute_post(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<NewInstitute>, JsonRejection>,
) -> ApiResult<ProvisionedInstitute> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let provisioned = provisioner::provision(&state.pool, user.user_id, request).await?;
    Ok(ApiResponse::created(provisioned).with_message("Institute created successfully!"))
}

/// GET /api/institute - the caller's active institute
pub async fn institute_get(State(state): State<AppState>, ctx: TenantContext) -> ApiResult<Institute> {
    let institute = provisioner::find_institute(&state.pool, ctx.tenant).await?;
    Ok(ApiResponse::success(institute))
}

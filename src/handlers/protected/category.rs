use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::models::Category;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::server::AppState;
use crate::services::category::{self, NewCategory};

/// POST /api/institute/category
pub async fn category_post(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<Category> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let created = category::create_category(&state.pool, ctx.tenant, request).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/institute/category
pub async fn category_list(State(state): State<AppState>, ctx: TenantContext) -> ApiResult<Vec<Category>> {
    Ok(ApiResponse::success(category::list_categories(&state.pool, ctx.tenant).await?))
}

/// DELETE /api/institute/category/:id
pub async fn category_delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "id")?;
    category::delete_category(&state.pool, ctx.tenant, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}

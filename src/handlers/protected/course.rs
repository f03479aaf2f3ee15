use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::models::CourseWithCategory;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::server::AppState;
use crate::services::course::{self, NewCourse};

/// POST /api/institute/course
pub async fn course_post(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Result<Json<NewCourse>, JsonRejection>,
) -> ApiResult<CourseWithCategory> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let created = course::create_course(&state.pool, ctx.tenant, request).await?;
    Ok(ApiResponse::created(created).with_message("Course created successfully"))
}

/// GET /api/institute/course
pub async fn course_list(State(state): State<AppState>, ctx: TenantContext) -> ApiResult<Vec<CourseWithCategory>> {
    Ok(ApiResponse::success(course::list_courses(&state.pool, ctx.tenant).await?))
}

/// GET /api/institute/course/:id
pub async fn course_get(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> ApiResult<CourseWithCategory> {
    let id = parse_id(&id, "id")?;
    Ok(ApiResponse::success(course::get_course(&state.pool, ctx.tenant, id).await?))
}

/// DELETE /api/institute/course/:id
pub async fn course_delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "id")?;
    course::delete_course(&state.pool, ctx.tenant, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })).with_message("Course deleted successfully"))
}

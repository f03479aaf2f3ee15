use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::models::Student;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::server::AppState;
use crate::services::student::{self, NewStudent};

/// POST /api/institute/student
pub async fn student_post(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Result<Json<NewStudent>, JsonRejection>,
) -> ApiResult<Student> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let created = student::create_student(&state.pool, ctx.tenant, request).await?;
    Ok(ApiResponse::created(created).with_message("Student created"))
}

/// GET /api/institute/student
pub async fn student_list(State(state): State<AppState>, ctx: TenantContext) -> ApiResult<Vec<Student>> {
    Ok(ApiResponse::success(student::list_students(&state.pool, ctx.tenant).await?))
}

/// GET /api/institute/student/:id
pub async fn student_get(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> ApiResult<Student> {
    let id = parse_id(&id, "id")?;
    Ok(ApiResponse::success(student::get_student(&state.pool, ctx.tenant, id).await?))
}

/// DELETE /api/institute/student/:id
pub async fn student_delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "id")?;
    student::delete_student(&state.pool, ctx.tenant, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })).with_message("Student deleted"))
}

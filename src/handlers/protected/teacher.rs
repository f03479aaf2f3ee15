use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::models::TeacherWithCourse;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::server::AppState;
use crate::services::teacher::{self, CreatedTeacher, NewTeacher};

/// POST /api/institute/teacher
pub async fn teacher_post(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Result<Json<NewTeacher>, JsonRejection>,
) -> ApiResult<CreatedTeacher> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let created = teacher::create_teacher(&state.pool, state.mailer.as_ref(), ctx.tenant, request).await?;
    Ok(ApiResponse::created(created).with_message("Teacher created successfully"))
}

/// GET /api/institute/teacher
pub async fn teacher_list(State(state): State<AppState>, ctx: TenantContext) -> ApiResult<Vec<TeacherWithCourse>> {
    Ok(ApiResponse::success(teacher::list_teachers(&state.pool, ctx.tenant).await?))
}

/// DELETE /api/institute/teacher/:id
pub async fn teacher_delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "id")?;
    teacher::delete_teacher(&state.pool, ctx.tenant, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })).with_message("Teacher deleted successfully"))
}

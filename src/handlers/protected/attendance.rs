use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};

use crate::database::models::Attendance;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::server::AppState;
use crate::services::attendance::{self, AttendanceFilter, NewAttendance};

/// POST /api/institute/attendance
pub async fn attendance_post(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Result<Json<NewAttendance>, JsonRejection>,
) -> ApiResult<Attendance> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let marked = attendance::mark_attendance(&state.pool, ctx.tenant, request).await?;
    Ok(ApiResponse::created(marked))
}

/// GET /api/institute/attendance?date=&courseId=
pub async fn attendance_list(
    State(state): State<AppState>,
    ctx: TenantContext,
    filter: Result<Query<AttendanceFilter>, QueryRejection>,
) -> ApiResult<Vec<Attendance>> {
    let Query(filter) = filter.map_err(ApiError::from)?;
    Ok(ApiResponse::success(
        attendance::list_attendance(&state.pool, ctx.tenant, &filter).await?,
    ))
}

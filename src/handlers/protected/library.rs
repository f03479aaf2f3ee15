use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::database::models::{Book, BorrowHistoryEntry};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::server::AppState;
use crate::services::library::{self, BookFilter, BookUpdate, BorrowRequest, LoanOutcome, NewBook, ReturnRequest};

/// POST /api/institute/library
pub async fn book_post(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> ApiResult<Book> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let book = library::create_book(&state.pool, ctx.tenant, request).await?;
    Ok(ApiResponse::created(book).with_message("Book added successfully"))
}

/// GET /api/institute/library?search=&category=&status=
pub async fn book_list(
    State(state): State<AppState>,
    ctx: TenantContext,
    filter: Result<Query<BookFilter>, QueryRejection>,
) -> ApiResult<Vec<Book>> {
    let Query(filter) = filter.map_err(ApiError::from)?;
    Ok(ApiResponse::success(library::list_books(&state.pool, ctx.tenant, &filter).await?))
}

/// GET /api/institute/library/:id
pub async fn book_get(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> ApiResult<Book> {
    let id = parse_id(&id, "id")?;
    Ok(ApiResponse::success(library::get_book(&state.pool, ctx.tenant, id).await?))
}

/// PATCH /api/institute/library/:id
pub async fn book_patch(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
    payload: Result<Json<BookUpdate>, JsonRejection>,
) -> ApiResult<Book> {
    let id = parse_id(&id, "id")?;
    let Json(update) = payload.map_err(ApiError::from)?;
    let book = library::update_book(&state.pool, ctx.tenant, id, update).await?;
    Ok(ApiResponse::success(book).with_message("Book updated successfully"))
}

/// DELETE /api/institute/library/:id
pub async fn book_delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "id")?;
    library::delete_book(&state.pool, ctx.tenant, id).await?;
    Ok(ApiResponse::success(json!({ "id": id })).with_message("Book deleted successfully"))
}

/// POST /api/institute/library/borrow
pub async fn borrow_post(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Result<Json<BorrowRequest>, JsonRejection>,
) -> ApiResult<LoanOutcome> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let outcome = library::borrow_book(&state.pool, ctx.tenant, request).await?;
    Ok(ApiResponse::success(outcome).with_message("Book borrowed successfully"))
}

/// POST /api/institute/library/return
pub async fn return_post(
    State(state): State<AppState>,
    ctx: TenantContext,
    payload: Result<Json<ReturnRequest>, JsonRejection>,
) -> ApiResult<LoanOutcome> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let outcome = library::return_book(&state.pool, ctx.tenant, request).await?;
    Ok(ApiResponse::success(outcome).with_message("Book returned successfully"))
}

/// GET /api/institute/library/history/:student_id
pub async fn borrow_history_get(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(student_id): Path<String>,
) -> ApiResult<Vec<BorrowHistoryEntry>> {
    let student_id = parse_id(&student_id, "studentId")?;
    Ok(ApiResponse::success(
        library::borrow_history(&state.pool, ctx.tenant, student_id).await?,
    ))
}

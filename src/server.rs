//! Router assembly and the HTTP listener.

use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    extract::State,
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::mail::Mailer;

/// Shared resources handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub mailer: Arc<dyn Mailer>,
}

/// Build the full application router
pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(institute_routes())
        .with_state(state)
        // Global middleware
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn institute_routes() -> Router<AppState> {
    use protected::{attendance, category, course, institute, library, student, teacher};

    Router::new()
        .route("/api/institute", post(institute::institute_post).get(institute::institute_get))
        .route("/api/institute/teacher", post(teacher::teacher_post).get(teacher::teacher_list))
        .route("/api/institute/teacher/:id", axum::routing::delete(teacher::teacher_delete))
        .route("/api/institute/student", post(student::student_post).get(student::student_list))
        .route(
            "/api/institute/student/:id",
            get(student::student_get).delete(student::student_delete),
        )
        .route("/api/institute/category", post(category::category_post).get(category::category_list))
        .route("/api/institute/category/:id", axum::routing::delete(category::category_delete))
        .route("/api/institute/course", post(course::course_post).get(course::course_list))
        .route(
            "/api/institute/course/:id",
            get(course::course_get).delete(course::course_delete),
        )
        .route(
            "/api/institute/attendance",
            post(attendance::attendance_post).get(attendance::attendance_list),
        )
        // Static library paths are matched ahead of `:id`
        .route("/api/institute/library", post(library::book_post).get(library::book_list))
        .route("/api/institute/library/borrow", post(library::borrow_post))
        .route("/api/institute/library/return", post(library::return_post))
        .route(
            "/api/institute/library/history/:student_id",
            get(library::borrow_history_get),
        )
        .route(
            "/api/institute/library/:id",
            get(library::book_get)
                .patch(library::book_patch)
                .delete(library::book_delete),
        )
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "EduFlow API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant institute management backend",
            "endpoints": {
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login (public)",
                "institute": "/api/institute (protected)",
                "tenant": "/api/institute/{teacher,student,category,course,attendance,library} (protected, requires institute)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

/// Bind and serve until the process is stopped
pub async fn run_server(state: AppState, config: &AppConfig, port: u16) -> anyhow::Result<()> {
    let app = app(state, config);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("EduFlow API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

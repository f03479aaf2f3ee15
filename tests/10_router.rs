// Router behaviour that needs no database: auth, tenant scoping and input
// rejection all happen before the first query.
mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{bearer, offline_app, send};

#[tokio::test]
async fn root_describes_the_service() {
    let app = offline_app();
    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "EduFlow API");
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let app = offline_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = offline_app();
    let (status, body) = send(&app, Method::GET, "/api/institute/library", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn garbage_tokens_are_rejected() {
    let app = offline_app();
    let (status, _) = send(&app, Method::GET, "/api/institute/student", Some("Bearer nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/institute/student", Some("Token abc"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tenant_routes_require_an_institute() {
    let app = offline_app();
    let token = bearer(None);
    let (status, body) = send(&app, Method::GET, "/api/institute/library", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn non_positive_institute_number_is_a_security_error() {
    let app = offline_app();
    let token = bearer(Some(-4));
    let (status, body) = send(&app, Method::GET, "/api/institute/teacher", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SECURITY_ERROR");
}

#[tokio::test]
async fn malformed_path_ids_are_validation_errors() {
    let app = offline_app();
    let token = bearer(Some(7));
    let (status, body) = send(&app, Method::GET, "/api/institute/library/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["id"], "Invalid UUID format: not-a-uuid");
}

#[tokio::test]
async fn malformed_borrow_body_is_a_validation_error() {
    let app = offline_app();
    let token = bearer(Some(7));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/institute/library/borrow",
        Some(&token),
        Some(json!({ "bookId": "12", "studentId": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn borrow_without_ids_is_rejected_before_the_database() {
    let app = offline_app();
    let token = bearer(Some(7));
    let (status, body) = send(&app, Method::POST, "/api/institute/library/borrow", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Book ID and Student ID are required");
}

#[tokio::test]
async fn institute_creation_lists_missing_fields() {
    let app = offline_app();
    let token = bearer(None);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/institute",
        Some(&token),
        Some(json!({ "instituteName": "Acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["instituteEmail"].is_string());
    assert!(body["field_errors"]["instituteAddress"].is_string());
}

#[tokio::test]
async fn registration_requires_credentials() {
    let app = offline_app();
    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(json!({ "username": "ana" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn unknown_course_level_is_rejected() {
    let app = offline_app();
    let token = bearer(Some(7));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/institute/course",
        Some(&token),
        Some(json!({ "courseName": "Rust", "courseLevel": "wizard" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

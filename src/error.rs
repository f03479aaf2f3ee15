// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::{DatabaseError, TableNameError};
use crate::services::provisioner::ProvisionError;
use crate::services::ServiceError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    /// Rejected tenant identifier or table name
    SecurityError(String),
    /// No capacity left for the requested operation
    CapacityError(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError {
        message: String,
        detail: Option<String>,
    },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } => 400,
            ApiError::SecurityError(_) => 400,
            ApiError::CapacityError(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError { .. } => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::SecurityError(msg) => msg,
            ApiError::CapacityError(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::SecurityError(_) => "SECURITY_ERROR",
            ApiError::CapacityError(_) => "CAPACITY_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body, hiding raw detail in production
    pub fn to_json(&self) -> Value {
        self.to_json_with_detail(!crate::is_production!())
    }

    pub fn to_json_with_detail(&self, expose_detail: bool) -> Value {
        let mut response = json!({
            "success": false,
            "message": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::ValidationError {
                field_errors: Some(field_errors),
                ..
            } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::InternalServerError {
                detail: Some(detail),
                ..
            } if expose_detail => {
                response["detail"] = json!(detail);
            }
            _ => {}
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn security_error(message: impl Into<String>) -> Self {
        ApiError::SecurityError(message.into())
    }

    pub fn capacity_error(message: impl Into<String>) -> Self {
        ApiError::CapacityError(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>, detail: Option<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            detail,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<TableNameError> for ApiError {
    fn from(err: TableNameError) -> Self {
        tracing::warn!("Rejected tenant table name: {}", err);
        ApiError::security_error(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::InvalidTableName(e) => e.into(),
            DatabaseError::UniqueViolation(constraint) => {
                tracing::debug!("Unique constraint violation on {}", constraint);
                ApiError::conflict("A record with the same unique value already exists")
            }
            DatabaseError::ForeignKeyViolation(constraint) => ApiError::validation_error(
                format!("Operation breaks a reference between records ({})", constraint),
                None,
            ),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::service_unavailable("Database is not configured")
            }
            ref unavailable if unavailable.is_unavailable() => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            other => {
                // Log the real error, the client only sees it outside production
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("Database error occurred", Some(other.to_string()))
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message, field_errors } => {
                ApiError::validation_error(message, field_errors)
            }
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Capacity(msg) => ApiError::capacity_error(msg),
            ServiceError::Unauthorized(msg) => ApiError::unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::Security(e) => e.into(),
            ServiceError::Database(e) => e.into(),
            ServiceError::PasswordHash(e) => {
                tracing::error!("Password hashing failed: {}", e);
                ApiError::internal_server_error("Failed to secure credentials", Some(e.to_string()))
            }
            ServiceError::Token(e) => {
                tracing::error!("Token generation failed: {}", e);
                ApiError::internal_server_error("Failed to issue token", Some(e.to_string()))
            }
        }
    }
}

impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::Validation { message, field_errors } => {
                ApiError::validation_error(message, Some(field_errors))
            }
            ProvisionError::Step {
                source: DatabaseError::InvalidTableName(e),
                ..
            } => e.into(),
            ProvisionError::Step { step, source } => {
                tracing::error!("Provisioning step '{}' failed: {}", step, source);
                ApiError::internal_server_error(
                    "Failed to provision institute",
                    Some(format!("step '{}': {}", step, source)),
                )
            }
            ProvisionError::Database(e) => e.into(),
            ProvisionError::Token(e) => {
                tracing::error!("Token generation failed after provisioning: {}", e);
                ApiError::internal_server_error("Failed to issue token", Some(e.to_string()))
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err.body_text()),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err.body_text()),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };
        ApiError::validation_error(message, None)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation_error(format!("Invalid query string: {}", rejection.body_text()), None)
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_status_codes() {
        assert_eq!(ApiError::validation_error("x", None).status_code(), 400);
        assert_eq!(ApiError::security_error("x").status_code(), 400);
        assert_eq!(ApiError::capacity_error("x").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::forbidden("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::internal_server_error("x", None).status_code(), 500);
    }

    #[test]
    fn detail_only_outside_production() {
        let err = ApiError::internal_server_error("Database error occurred", Some("relation missing".into()));
        let dev = err.to_json_with_detail(true);
        assert_eq!(dev["success"], false);
        assert_eq!(dev["message"], "Database error occurred");
        assert_eq!(dev["detail"], "relation missing");

        let prod = err.to_json_with_detail(false);
        assert!(prod.get("detail").is_none());
        assert_eq!(prod["code"], "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn table_name_errors_become_security_errors() {
        let api: ApiError = TableNameError::InvalidTenantId("1;DROP".into()).into();
        assert_eq!(api.error_code(), "SECURITY_ERROR");
        assert_eq!(api.status_code(), 400);

        let nested: ApiError = DatabaseError::InvalidTableName(TableNameError::InvalidPrefix("X".into())).into();
        assert_eq!(nested.error_code(), "SECURITY_ERROR");
    }

    #[test]
    fn service_errors_map_to_taxonomy() {
        let capacity: ApiError = ServiceError::Capacity("No copies available for borrowing".into()).into();
        assert_eq!(capacity.status_code(), 400);
        assert_eq!(capacity.error_code(), "CAPACITY_ERROR");

        let missing: ApiError = ServiceError::not_found("Borrow record not found or already returned").into();
        assert_eq!(missing.status_code(), 404);

        let dup: ApiError = ServiceError::Database(DatabaseError::UniqueViolation("users_email_key".into())).into();
        assert_eq!(dup.status_code(), 409);
    }

    #[test]
    fn validation_body_carries_field_errors() {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), "This field is required".to_string());
        let body = ApiError::validation_error("Please provide title", Some(fields)).to_json();
        assert_eq!(body["field_errors"]["title"], "This field is required");
    }

    #[test]
    fn provisioning_step_failure_is_internal() {
        let err = ProvisionError::Step {
            step: "create_table:library_".to_string(),
            source: DatabaseError::Sqlx(sqlx::Error::RowNotFound),
        };
        let api: ApiError = err.into();
        assert_eq!(api.status_code(), 500);
        match api {
            ApiError::InternalServerError { detail, .. } => {
                assert!(detail.unwrap().contains("create_table:library_"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

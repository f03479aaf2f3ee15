use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::models::User;
use crate::services::{required, RequiredFields, ServiceError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub current_institute_number: Option<i64>,
}

pub async fn register(pool: &PgPool, request: RegisterRequest) -> Result<User, ServiceError> {
    RequiredFields::new()
        .text("username", request.username.as_deref())
        .text("email", request.email.as_deref())
        .text("password", request.password.as_deref())
        .finish("Please provide")?;

    let password = request.password.unwrap_or_default();
    let password_hash = hash_password(&password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (user_name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(required(request.username))
    .bind(required(request.email).to_lowercase())
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(user)
}

/// Check credentials and issue a token scoped to the user's active institute
pub async fn login(pool: &PgPool, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
    RequiredFields::new()
        .text("email", request.email.as_deref())
        .text("password", request.password.as_deref())
        .finish("Please provide")?;

    let email = required(request.email).to_lowercase();
    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not registered"))?;

    if !verify_password(&request.password.unwrap_or_default(), &user.password_hash) {
        tracing::debug!(user_id = %user.id, "Login rejected, password mismatch");
        return Err(ServiceError::Forbidden("Invalid email or password".to_string()));
    }

    let token = generate_jwt(&Claims::new(user.id, user.role.clone(), user.current_institute_number))?;

    Ok(LoginResponse {
        token,
        username: user.user_name,
        current_institute_number: user.current_institute_number,
    })
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Length of passwords generated for staff accounts
pub const GENERATED_PASSWORD_LEN: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id from the shared `users` catalog
    pub sub: Uuid,
    pub role: String,
    /// Active institute, absent until the user provisions or joins one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institute_number: Option<i64>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: impl Into<String>, institute_number: Option<i64>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            role: role.into(),
            institute_number,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

fn secret() -> Result<&'static str, JwtError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate signature and expiry, returning the embedded claims
pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, config::config().security.bcrypt_cost)
}

/// Malformed stored hashes count as a mismatch
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

/// Random alphanumeric password for accounts created on someone's behalf
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

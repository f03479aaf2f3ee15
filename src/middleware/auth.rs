use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims};
use crate::database::TenantId;
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
    pub institute_number: Option<i64>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            institute_number: claims.institute_number,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let token = match extract_jwt_from_headers(&headers) {
        Ok(token) => token,
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    };

    let claims = match validate_jwt(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            return ApiError::unauthorized(e.to_string()).into_response();
        }
    };

    request.extensions_mut().insert(AuthUser::from(claims));

    next.run(request).await
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Per-request tenant scope: who is calling and which institute they act on.
///
/// Built from the validated token, never from mutable session state, so every
/// tenant query receives its institute explicitly.
#[derive(Clone, Copy, Debug)]
pub struct TenantContext {
    pub user_id: Uuid,
    pub tenant: TenantId,
}

impl TenantContext {
    pub fn from_auth(user: &AuthUser) -> Result<Self, ApiError> {
        let number = user
            .institute_number
            .ok_or_else(|| ApiError::forbidden("No active institute; create or select an institute first"))?;
        let tenant = TenantId::new(number)?;
        Ok(Self {
            user_id: user.user_id,
            tenant,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        TenantContext::from_auth(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert!(extract_jwt_from_headers(&headers("Basic abc")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
    }

    #[test]
    fn tenant_context_requires_institute() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: "student".into(),
            institute_number: None,
        };
        let err = TenantContext::from_auth(&user).unwrap_err();
        assert_eq!(err.status_code(), 403);

        let scoped = TenantContext::from_auth(&AuthUser {
            institute_number: Some(9001),
            ..user
        })
        .unwrap();
        assert_eq!(scoped.tenant.value(), 9001);
    }

    #[test]
    fn non_positive_institute_is_a_security_error() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: "institute".into(),
            institute_number: Some(0),
        };
        assert_eq!(TenantContext::from_auth(&user).unwrap_err().error_code(), "SECURITY_ERROR");
    }
}

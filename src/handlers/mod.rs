// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (JWT auth, tenant scoped through TenantContext)
pub mod protected;
pub mod public;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path identifier, reporting malformed ids as validation errors
pub(crate) fn parse_id(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        let mut field_errors = std::collections::HashMap::new();
        field_errors.insert(field.to_string(), format!("Invalid UUID format: {}", raw));
        ApiError::validation_error("Invalid identifier", Some(field_errors))
    })
}

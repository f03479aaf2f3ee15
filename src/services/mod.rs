//! Tenant-scoped domain services.
//!
//! Services take an executor (`&PgPool` or a transaction) plus a [`TenantId`]
//! and build every table name through [`EntityTable::table_for`]. Values are
//! always bound, never formatted into SQL.
//!
//! [`TenantId`]: crate::database::TenantId
//! [`EntityTable::table_for`]: crate::database::EntityTable::table_for

use std::collections::HashMap;

use thiserror::Error;

use crate::auth::JwtError;
use crate::database::{DatabaseError, TableNameError};

pub mod attendance;
pub mod category;
pub mod course;
pub mod library;
pub mod mail;
pub mod provisioner;
pub mod security_log;
pub mod student;
pub mod teacher;
pub mod user;

/// Errors surfaced by domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Capacity(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Security(#[from] TableNameError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(err.into())
    }
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }
}

/// Collects required-field failures so one response can list all of them
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: HashMap<String, String>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if value.map_or(true, |v| v.trim().is_empty()) {
            self.missing
                .insert(field.to_string(), "This field is required".to_string());
        }
        self
    }

    pub fn present<T>(&mut self, field: &str, value: Option<&T>) -> &mut Self {
        if value.is_none() {
            self.missing
                .insert(field.to_string(), "This field is required".to_string());
        }
        self
    }

    pub fn finish(&mut self, message: &str) -> Result<(), ServiceError> {
        if self.missing.is_empty() {
            return Ok(());
        }
        let mut fields: Vec<&str> = self.missing.keys().map(String::as_str).collect();
        fields.sort_unstable();
        Err(ServiceError::Validation {
            message: format!("{}: {}", message, fields.join(", ")),
            field_errors: Some(std::mem::take(&mut self.missing)),
        })
    }
}

/// Image used when a profile photo is not supplied
pub const DEFAULT_PROFILE_IMAGE: &str =
    "https://static.vecteezy.com/system/resources/thumbnails/001/840/618/small/picture-profile-icon-male-icon-human-or-people-sign-and-symbol-free-vector.jpg";

/// Trim and drop blank optional text
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Unwrap a field that [`RequiredFields`] already checked
pub(crate) fn required(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_lists_every_missing_field() {
        let err = RequiredFields::new()
            .text("instituteName", Some("Acme"))
            .text("instituteEmail", None)
            .text("institutePhoneNumber", Some("   "))
            .present::<i32>("total", None)
            .finish("Please provide")
            .unwrap_err();

        match err {
            ServiceError::Validation { message, field_errors } => {
                assert_eq!(message, "Please provide: instituteEmail, institutePhoneNumber, total");
                assert_eq!(field_errors.unwrap().len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn complete_payload_passes() {
        assert!(RequiredFields::new()
            .text("title", Some("Dune"))
            .present("copies", Some(&1))
            .finish("Please provide")
            .is_ok());
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  x ".into())), Some("x".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}

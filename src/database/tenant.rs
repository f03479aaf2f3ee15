//! Tenant identifiers and tenant-scoped table names.
//!
//! Every institute owns its own copy of the entity tables, named
//! `<prefix><institute_number>` (e.g. `library_borrow_1042`). Table names are
//! the one place where SQL text is built from runtime data, so a [`TableName`]
//! can only be produced by [`resolve_table_name`], which validates both halves
//! against the `^[a-z_]+_[0-9]+$` allow-list before any query exists.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rejections raised while resolving a tenant table name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableNameError {
    #[error("Invalid tenant id: {0:?}")]
    InvalidTenantId(String),

    #[error("Invalid table prefix: {0:?}")]
    InvalidPrefix(String),
}

/// Numeric institute number that keys every per-tenant table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct TenantId(i64);

impl TenantId {
    pub fn new(value: i64) -> Result<Self, TableNameError> {
        if value <= 0 {
            return Err(TableNameError::InvalidTenantId(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Parse from untrusted text. Only plain ASCII digits are accepted.
    pub fn parse(raw: &str) -> Result<Self, TableNameError> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TableNameError::InvalidTenantId(raw.to_string()));
        }
        let value: i64 = raw
            .parse()
            .map_err(|_| TableNameError::InvalidTenantId(raw.to_string()))?;
        Self::new(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for TenantId {
    type Error = TableNameError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for i64 {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated per-tenant table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier rendered for SQL text
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build `prefix + tenant` after validating both parts.
///
/// The prefix must be non-empty, consist of `[a-z_]` and end with `_`; the
/// tenant id is already a positive integer by construction.
pub fn resolve_table_name(prefix: &str, tenant: TenantId) -> Result<TableName, TableNameError> {
    if !is_valid_prefix(prefix) {
        return Err(TableNameError::InvalidPrefix(prefix.to_string()));
    }
    Ok(TableName(format!("{}{}", prefix, tenant)))
}

/// Variant of [`resolve_table_name`] for tenant ids that arrive as text
pub fn resolve_table_name_str(prefix: &str, raw_tenant: &str) -> Result<TableName, TableNameError> {
    let tenant = TenantId::parse(raw_tenant)?;
    resolve_table_name(prefix, tenant)
}

fn is_valid_prefix(prefix: &str) -> bool {
    prefix.len() >= 2
        && prefix.ends_with('_')
        && prefix.bytes().any(|b| b.is_ascii_lowercase())
        && prefix.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}

/// The fixed catalog of per-tenant tables, in foreign-key dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTable {
    Category,
    Course,
    Teacher,
    Student,
    CourseChapter,
    ChapterLesson,
    Attendance,
    Assessment,
    Result,
    FeeStructure,
    FeePayment,
    ExamSchedule,
    SecurityLog,
    Library,
    LibraryBorrow,
}

impl EntityTable {
    pub const ALL: [EntityTable; 15] = [
        EntityTable::Category,
        EntityTable::Course,
        EntityTable::Teacher,
        EntityTable::Student,
        EntityTable::CourseChapter,
        EntityTable::ChapterLesson,
        EntityTable::Attendance,
        EntityTable::Assessment,
        EntityTable::Result,
        EntityTable::FeeStructure,
        EntityTable::FeePayment,
        EntityTable::ExamSchedule,
        EntityTable::SecurityLog,
        EntityTable::Library,
        EntityTable::LibraryBorrow,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            EntityTable::Category => "category_",
            EntityTable::Course => "course_",
            EntityTable::Teacher => "teacher_",
            EntityTable::Student => "student_",
            EntityTable::CourseChapter => "course_chapter_",
            EntityTable::ChapterLesson => "chapter_lesson_",
            EntityTable::Attendance => "attendance_",
            EntityTable::Assessment => "assessment_",
            EntityTable::Result => "result_",
            EntityTable::FeeStructure => "fee_structure_",
            EntityTable::FeePayment => "fee_payment_",
            EntityTable::ExamSchedule => "exam_schedule_",
            EntityTable::SecurityLog => "security_log_",
            EntityTable::Library => "library_",
            EntityTable::LibraryBorrow => "library_borrow_",
        }
    }

    pub fn table_for(self, tenant: TenantId) -> Result<TableName, TableNameError> {
        resolve_table_name(self.prefix(), tenant)
    }
}

/// Returns true when `name` has the `^[a-z_]+_[0-9]+$` shape
pub fn is_tenant_table_name(name: &str) -> bool {
    let Some(split) = name.rfind('_') else {
        return false;
    };
    let (head, digits) = name.split_at(split + 1);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && head.len() >= 2
        && head.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_catalog_names() {
        let tenant = TenantId::new(1042).unwrap();
        let name = resolve_table_name("library_borrow_", tenant).unwrap();
        assert_eq!(name.as_str(), "library_borrow_1042");
        assert_eq!(name.quoted(), "\"library_borrow_1042\"");
    }

    #[test]
    fn rejects_non_positive_tenants() {
        assert!(TenantId::new(0).is_err());
        assert!(TenantId::new(-7).is_err());
    }

    #[test]
    fn parse_accepts_only_plain_digits() {
        assert_eq!(TenantId::parse("981234").unwrap().value(), 981234);
        for raw in ["", "0", "-1", "+5", " 5", "5 ", "12a", "1;DROP TABLE users", "1e3", "٣"] {
            assert!(TenantId::parse(raw).is_err(), "accepted {raw:?}");
        }
        // Overflowing i64 is rejected rather than wrapped
        assert!(TenantId::parse("99999999999999999999").is_err());
    }

    #[test]
    fn rejects_bad_prefixes() {
        let tenant = TenantId::new(1).unwrap();
        for prefix in ["", "_", "teacher", "Teacher_", "teacher-", "t1_", "x\"_", "student_;--_"] {
            assert_eq!(
                resolve_table_name(prefix, tenant),
                Err(TableNameError::InvalidPrefix(prefix.to_string())),
                "accepted prefix {prefix:?}"
            );
        }
    }

    #[test]
    fn string_tenant_is_checked_before_any_name_exists() {
        assert!(matches!(
            resolve_table_name_str("student_", "1 OR 1=1"),
            Err(TableNameError::InvalidTenantId(_))
        ));
        assert_eq!(
            resolve_table_name_str("student_", "77").unwrap().as_str(),
            "student_77"
        );
    }

    #[test]
    fn every_catalog_entry_matches_allow_list() {
        let tenant = TenantId::new(555).unwrap();
        for entity in EntityTable::ALL {
            let name = entity.table_for(tenant).unwrap();
            assert!(is_tenant_table_name(name.as_str()), "{name} failed the allow-list");
        }
    }

    #[test]
    fn allow_list_shape() {
        assert!(is_tenant_table_name("fee_payment_12"));
        assert!(!is_tenant_table_name("fee_payment_"));
        assert!(!is_tenant_table_name("fee_payment"));
        assert!(!is_tenant_table_name("Fee_payment_12"));
        assert!(!is_tenant_table_name("_12"));
        assert!(!is_tenant_table_name("fee_12a"));
    }

    #[test]
    fn tenant_id_serde_rejects_zero() {
        assert!(serde_json::from_str::<TenantId>("0").is_err());
        assert_eq!(serde_json::from_str::<TenantId>("42").unwrap().value(), 42);
        assert_eq!(serde_json::to_string(&TenantId::new(42).unwrap()).unwrap(), "42");
    }
}

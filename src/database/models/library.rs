use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// At or below this many available copies a book is reported as low stock
pub const LOW_STOCK_THRESHOLD: i32 = 3;

/// Stock level of a book, always derived from `available_copies`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    Available,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn from_available(available_copies: i32) -> Self {
        if available_copies <= 0 {
            StockStatus::OutOfStock
        } else if available_copies <= LOW_STOCK_THRESHOLD {
            StockStatus::LowStock
        } else {
            StockStatus::Available
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Available => "available",
            StockStatus::LowStock => "low-stock",
            StockStatus::OutOfStock => "out-of-stock",
        }
    }
}

impl TryFrom<String> for StockStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "available" => Ok(StockStatus::Available),
            "low-stock" => Ok(StockStatus::LowStock),
            "out-of-stock" => Ok(StockStatus::OutOfStock),
            other => Err(format!("unknown stock status '{}'", other)),
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub published_year: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn borrowed_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Lifecycle of a borrow record: `borrowed -> returned`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
}

impl BorrowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::Returned => "returned",
        }
    }
}

impl TryFrom<String> for BorrowStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "borrowed" => Ok(BorrowStatus::Borrowed),
            "returned" => Ok(BorrowStatus::Returned),
            other => Err(format!("unknown borrow status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: Uuid,
    pub book_id: Uuid,
    pub student_id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub return_date: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: BorrowStatus,
    pub created_at: DateTime<Utc>,
}

/// Borrow record joined with book details; `overdue` is computed at read time
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BorrowHistoryEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: BorrowRecord,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub overdue: bool,
}

//! Library catalog and the borrow/return transaction.
//!
//! `available_copies` only changes inside a transaction that holds the book
//! row lock (`SELECT ... FOR UPDATE`), and `status` is rewritten from the new
//! count in the same statement, so the stored stock status always matches
//! [`StockStatus::from_available`].

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::{Book, BorrowHistoryEntry, BorrowRecord, StockStatus};
use crate::database::{EntityTable, TenantId};
use crate::services::{non_blank, required, RequiredFields, ServiceError};

/// Category value that means "no category filter"
pub const ALL_CATEGORIES: &str = "All Categories";
pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub total_copies: Option<i32>,
    pub published_year: Option<i32>,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub total_copies: Option<i32>,
    pub published_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<StockStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub book_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub borrow_id: Option<Uuid>,
}

/// Borrow record together with the book state after the change
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOutcome {
    pub borrow: BorrowRecord,
    pub book: Book,
}

/// Escape LIKE metacharacters so user input matches literally
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Available copies after the total changes, keeping borrowed copies out
fn rebalance_available(new_total: i32, borrowed: i32) -> Result<i32, ServiceError> {
    if new_total < 1 {
        return Err(ServiceError::validation("Total copies must be at least 1"));
    }
    if new_total < borrowed {
        return Err(ServiceError::validation(format!(
            "Total copies cannot be lower than the {} copies currently borrowed",
            borrowed
        )));
    }
    Ok(new_total - borrowed)
}

pub async fn create_book(pool: &PgPool, tenant: TenantId, book: NewBook) -> Result<Book, ServiceError> {
    RequiredFields::new()
        .text("title", book.title.as_deref())
        .text("author", book.author.as_deref())
        .text("isbn", book.isbn.as_deref())
        .finish("Title, Author, and ISBN are required")?;

    let total = book.total_copies.unwrap_or(1);
    if total < 1 {
        return Err(ServiceError::validation("Total copies must be at least 1"));
    }

    let table = EntityTable::Library.table_for(tenant)?;
    let sql = format!(
        r#"
        INSERT INTO {} (title, author, isbn, category, description, cover_image,
                        total_copies, available_copies, published_year, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $9)
        RETURNING *
        "#,
        table.quoted()
    );

    let created: Book = sqlx::query_as(&sql)
        .bind(required(book.title))
        .bind(required(book.author))
        .bind(required(book.isbn))
        .bind(non_blank(book.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()))
        .bind(non_blank(book.description))
        .bind(non_blank(book.cover_image))
        .bind(total)
        .bind(book.published_year.unwrap_or_else(|| Utc::now().year()))
        .bind(StockStatus::from_available(total).as_str())
        .fetch_one(pool)
        .await?;

    tracing::info!(tenant = %tenant, book_id = %created.id, "Book added to library");
    Ok(created)
}

pub async fn list_books(pool: &PgPool, tenant: TenantId, filter: &BookFilter) -> Result<Vec<Book>, ServiceError> {
    let table = EntityTable::Library.table_for(tenant)?;
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT * FROM {} WHERE TRUE", table.quoted()));

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR author ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR isbn ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category) = filter
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    {
        query.push(" AND category = ").push_bind(category.to_string());
    }

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }

    query.push(" ORDER BY created_at DESC");

    Ok(query.build_query_as::<Book>().fetch_all(pool).await?)
}

pub async fn get_book(pool: &PgPool, tenant: TenantId, id: Uuid) -> Result<Book, ServiceError> {
    let table = EntityTable::Library.table_for(tenant)?;
    sqlx::query_as::<_, Book>(&format!("SELECT * FROM {} WHERE id = $1", table.quoted()))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Book not found"))
}

pub async fn update_book(
    pool: &PgPool,
    tenant: TenantId,
    id: Uuid,
    update: BookUpdate,
) -> Result<Book, ServiceError> {
    let table = EntityTable::Library.table_for(tenant)?.quoted();
    let mut tx = pool.begin().await?;

    let current: Book = sqlx::query_as(&format!("SELECT * FROM {} WHERE id = $1 FOR UPDATE", table))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Book not found"))?;

    let total = update.total_copies.unwrap_or(current.total_copies);
    let available = rebalance_available(total, current.borrowed_copies())?;

    let sql = format!(
        r#"
        UPDATE {}
        SET title = $1, author = $2, isbn = $3, category = $4, description = $5,
            cover_image = $6, total_copies = $7, available_copies = $8,
            published_year = $9, status = $10, updated_at = now()
        WHERE id = $11
        RETURNING *
        "#,
        table
    );

    let updated: Book = sqlx::query_as(&sql)
        .bind(non_blank(update.title).unwrap_or(current.title))
        .bind(non_blank(update.author).unwrap_or(current.author))
        .bind(non_blank(update.isbn).unwrap_or(current.isbn))
        .bind(non_blank(update.category).unwrap_or(current.category))
        .bind(update.description.or(current.description))
        .bind(update.cover_image.or(current.cover_image))
        .bind(total)
        .bind(available)
        .bind(update.published_year.or(current.published_year))
        .bind(StockStatus::from_available(available).as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(updated)
}

pub async fn delete_book(pool: &PgPool, tenant: TenantId, id: Uuid) -> Result<(), ServiceError> {
    let table = EntityTable::Library.table_for(tenant)?;
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table.quoted()))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Book not found"));
    }
    Ok(())
}

/// Lend one copy of a book to a student.
///
/// Fails with a capacity error, and changes nothing, when no copy is left.
pub async fn borrow_book(pool: &PgPool, tenant: TenantId, request: BorrowRequest) -> Result<LoanOutcome, ServiceError> {
    let (book_id, student_id) = match (request.book_id, request.student_id) {
        (Some(book_id), Some(student_id)) => (book_id, student_id),
        _ => return Err(ServiceError::validation("Book ID and Student ID are required")),
    };

    let books = EntityTable::Library.table_for(tenant)?.quoted();
    let borrows = EntityTable::LibraryBorrow.table_for(tenant)?.quoted();
    let students = EntityTable::Student.table_for(tenant)?.quoted();

    let mut tx = pool.begin().await?;

    let book: Book = sqlx::query_as(&format!("SELECT * FROM {} WHERE id = $1 FOR UPDATE", books))
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Book not found"))?;

    let student_exists: bool = sqlx::query_scalar(&format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", students))
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;
    if !student_exists {
        return Err(ServiceError::not_found("Student not found"));
    }

    if book.available_copies <= 0 {
        tracing::debug!(tenant = %tenant, book_id = %book_id, "Borrow refused, no copies left");
        return Err(ServiceError::Capacity("No copies available for borrowing".to_string()));
    }

    let borrow: BorrowRecord = sqlx::query_as(&format!(
        r#"
        INSERT INTO {} (book_id, student_id, borrow_date, due_date, status)
        VALUES ($1, $2, now(), $3, 'borrowed')
        RETURNING *
        "#,
        borrows
    ))
    .bind(book_id)
    .bind(student_id)
    .bind(request.due_date)
    .fetch_one(&mut *tx)
    .await?;

    let remaining = book.available_copies - 1;
    let book: Book = sqlx::query_as(&format!(
        "UPDATE {} SET available_copies = $1, status = $2, updated_at = now() WHERE id = $3 RETURNING *",
        books
    ))
    .bind(remaining)
    .bind(StockStatus::from_available(remaining).as_str())
    .bind(book_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        tenant = %tenant,
        book_id = %book_id,
        student_id = %student_id,
        available = remaining,
        "Book borrowed"
    );
    Ok(LoanOutcome { borrow, book })
}

/// Close an open borrow record and put the copy back on the shelf.
///
/// Returned records are terminal; returning one again is reported as not found.
pub async fn return_book(pool: &PgPool, tenant: TenantId, request: ReturnRequest) -> Result<LoanOutcome, ServiceError> {
    let borrow_id = request
        .borrow_id
        .ok_or_else(|| ServiceError::validation("Borrow ID is required"))?;

    let books = EntityTable::Library.table_for(tenant)?.quoted();
    let borrows = EntityTable::LibraryBorrow.table_for(tenant)?.quoted();

    let mut tx = pool.begin().await?;

    let open: BorrowRecord = sqlx::query_as(&format!(
        "SELECT * FROM {} WHERE id = $1 AND status = 'borrowed' FOR UPDATE",
        borrows
    ))
    .bind(borrow_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ServiceError::not_found("Borrow record not found or already returned"))?;

    let book: Book = sqlx::query_as(&format!("SELECT * FROM {} WHERE id = $1 FOR UPDATE", books))
        .bind(open.book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Book not found"))?;

    let borrow: BorrowRecord = sqlx::query_as(&format!(
        "UPDATE {} SET status = 'returned', return_date = now() WHERE id = $1 RETURNING *",
        borrows
    ))
    .bind(borrow_id)
    .fetch_one(&mut *tx)
    .await?;

    let available = (book.available_copies + 1).min(book.total_copies);
    let book: Book = sqlx::query_as(&format!(
        "UPDATE {} SET available_copies = $1, status = $2, updated_at = now() WHERE id = $3 RETURNING *",
        books
    ))
    .bind(available)
    .bind(StockStatus::from_available(available).as_str())
    .bind(open.book_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(tenant = %tenant, borrow_id = %borrow_id, available, "Book returned");
    Ok(LoanOutcome { borrow, book })
}

/// Every borrow by a student, newest first
pub async fn borrow_history(
    pool: &PgPool,
    tenant: TenantId,
    student_id: Uuid,
) -> Result<Vec<BorrowHistoryEntry>, ServiceError> {
    let books = EntityTable::Library.table_for(tenant)?.quoted();
    let borrows = EntityTable::LibraryBorrow.table_for(tenant)?.quoted();

    let sql = format!(
        r#"
        SELECT b.*, l.title, l.author, l.isbn,
               (b.status = 'borrowed' AND b.due_date IS NOT NULL AND b.due_date < CURRENT_DATE) AS overdue
        FROM {} AS b
        JOIN {} AS l ON b.book_id = l.id
        WHERE b.student_id = $1
        ORDER BY b.borrow_date DESC
        "#,
        borrows, books
    );

    Ok(sqlx::query_as::<_, BorrowHistoryEntry>(&sql)
        .bind(student_id)
        .fetch_all(pool)
        .await?)
}

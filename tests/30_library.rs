// Library loans against a live Postgres. Skipped when DATABASE_URL is unset.
mod common;

use chrono::NaiveDate;

use eduflow_api::database::models::{BorrowStatus, StockStatus};
use eduflow_api::database::TenantId;
use eduflow_api::services::library::{self, BookFilter, BookUpdate, BorrowRequest, NewBook, ReturnRequest};
use eduflow_api::services::student::{self, NewStudent};
use eduflow_api::services::ServiceError;
use sqlx::PgPool;
use uuid::Uuid;

fn book(title: &str, copies: i32) -> NewBook {
    NewBook {
        title: Some(title.into()),
        author: Some("A. Writer".into()),
        isbn: Some(format!("isbn-{}", Uuid::new_v4())),
        total_copies: Some(copies),
        ..Default::default()
    }
}

async fn enrol(pool: &PgPool, tenant: TenantId) -> Uuid {
    student::create_student(
        pool,
        tenant,
        NewStudent {
            first_name: Some("Mia".into()),
            last_name: Some("Khan".into()),
            student_phone_no: Some("555-0199".into()),
            student_address: Some("9 Elm St".into()),
            enrolled_date: NaiveDate::from_ymd_opt(2024, 9, 1),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn last_copy_can_be_borrowed_once() {
    let Some(pool) = common::database().await else { return };
    let (_, tenant) = common::provisioned_institute(&pool).await.unwrap();
    let student_id = enrol(&pool, tenant).await;

    let created = library::create_book(&pool, tenant, book("Dune", 1)).await.unwrap();
    assert_eq!(created.available_copies, 1);
    assert_eq!(created.status, StockStatus::LowStock);

    let loan = library::borrow_book(
        &pool,
        tenant,
        BorrowRequest { book_id: Some(created.id), student_id: Some(student_id), due_date: None },
    )
    .await
    .unwrap();
    assert_eq!(loan.book.available_copies, 0);
    assert_eq!(loan.book.status, StockStatus::OutOfStock);
    assert_eq!(loan.borrow.status, BorrowStatus::Borrowed);

    let err = library::borrow_book(
        &pool,
        tenant,
        BorrowRequest { book_id: Some(created.id), student_id: Some(student_id), due_date: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Capacity(_)));

    // The refused borrow left nothing behind
    let history = library::borrow_history(&pool, tenant, student_id).await.unwrap();
    assert_eq!(history.len(), 1);
    let stored = library::get_book(&pool, tenant, created.id).await.unwrap();
    assert_eq!(stored.available_copies, 0);
}

#[tokio::test]
async fn returning_restores_stock_exactly_once() {
    let Some(pool) = common::database().await else { return };
    let (_, tenant) = common::provisioned_institute(&pool).await.unwrap();
    let student_id = enrol(&pool, tenant).await;
    let created = library::create_book(&pool, tenant, book("Emma", 4)).await.unwrap();
    assert_eq!(created.status, StockStatus::Available);

    let loan = library::borrow_book(
        &pool,
        tenant,
        BorrowRequest { book_id: Some(created.id), student_id: Some(student_id), due_date: None },
    )
    .await
    .unwrap();
    assert_eq!(loan.book.available_copies, 3);
    assert_eq!(loan.book.status, StockStatus::LowStock);

    let returned = library::return_book(&pool, tenant, ReturnRequest { borrow_id: Some(loan.borrow.id) })
        .await
        .unwrap();
    assert_eq!(returned.book.available_copies, 4);
    assert_eq!(returned.book.status, StockStatus::Available);
    assert_eq!(returned.borrow.status, BorrowStatus::Returned);
    assert!(returned.borrow.return_date.is_some());

    let err = library::return_book(&pool, tenant, ReturnRequest { borrow_id: Some(loan.borrow.id) })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let stored = library::get_book(&pool, tenant, created.id).await.unwrap();
    assert_eq!(stored.available_copies, 4);
}

#[tokio::test]
async fn history_flags_overdue_loans() {
    let Some(pool) = common::database().await else { return };
    let (_, tenant) = common::provisioned_institute(&pool).await.unwrap();
    let student_id = enrol(&pool, tenant).await;
    let created = library::create_book(&pool, tenant, book("Beloved", 2)).await.unwrap();

    library::borrow_book(
        &pool,
        tenant,
        BorrowRequest {
            book_id: Some(created.id),
            student_id: Some(student_id),
            due_date: NaiveDate::from_ymd_opt(2000, 1, 1),
        },
    )
    .await
    .unwrap();

    let history = library::borrow_history(&pool, tenant, student_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].title, "Beloved");
    assert!(history[0].overdue);
}

#[tokio::test]
async fn borrowing_for_an_unknown_student_is_not_found() {
    let Some(pool) = common::database().await else { return };
    let (_, tenant) = common::provisioned_institute(&pool).await.unwrap();
    let created = library::create_book(&pool, tenant, book("Ulysses", 2)).await.unwrap();

    let err = library::borrow_book(
        &pool,
        tenant,
        BorrowRequest { book_id: Some(created.id), student_id: Some(Uuid::new_v4()), due_date: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let stored = library::get_book(&pool, tenant, created.id).await.unwrap();
    assert_eq!(stored.available_copies, 2);
}

#[tokio::test]
async fn total_cannot_drop_below_copies_on_loan() {
    let Some(pool) = common::database().await else { return };
    let (_, tenant) = common::provisioned_institute(&pool).await.unwrap();
    let student_id = enrol(&pool, tenant).await;
    let created = library::create_book(&pool, tenant, book("Middlemarch", 2)).await.unwrap();
    library::borrow_book(
        &pool,
        tenant,
        BorrowRequest { book_id: Some(created.id), student_id: Some(student_id), due_date: None },
    )
    .await
    .unwrap();

    let err = library::update_book(&pool, tenant, created.id, BookUpdate { total_copies: Some(0), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));

    let grown = library::update_book(&pool, tenant, created.id, BookUpdate { total_copies: Some(10), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(grown.total_copies, 10);
    assert_eq!(grown.available_copies, 9);
    assert_eq!(grown.status, StockStatus::Available);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let Some(pool) = common::database().await else { return };
    let (_, tenant) = common::provisioned_institute(&pool).await.unwrap();
    library::create_book(&pool, tenant, book("100% Rust", 1)).await.unwrap();
    library::create_book(&pool, tenant, book("1000 Rust Tips", 1)).await.unwrap();

    let filter = BookFilter { search: Some("100%".into()), ..Default::default() };
    let found = library::list_books(&pool, tenant, &filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "100% Rust");

    let everything = BookFilter { category: Some("All Categories".into()), ..Default::default() };
    assert_eq!(library::list_books(&pool, tenant, &everything).await.unwrap().len(), 2);
}

#[tokio::test]
async fn tenants_do_not_see_each_other() {
    let Some(pool) = common::database().await else { return };
    let (_, first) = common::provisioned_institute(&pool).await.unwrap();
    let (_, second) = common::provisioned_institute(&pool).await.unwrap();
    let created = library::create_book(&pool, first, book("Only Mine", 1)).await.unwrap();

    let err = library::get_book(&pool, second, created.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn students_with_open_loans_cannot_be_deleted() {
    let Some(pool) = common::database().await else { return };
    let (_, tenant) = common::provisioned_institute(&pool).await.unwrap();
    let student_id = enrol(&pool, tenant).await;
    let created = library::create_book(&pool, tenant, book("Persuasion", 1)).await.unwrap();

    let loan = library::borrow_book(
        &pool,
        tenant,
        BorrowRequest { book_id: Some(created.id), student_id: Some(student_id), due_date: None },
    )
    .await
    .unwrap();

    let err = student::delete_student(&pool, tenant, student_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));

    // The loan is still open and the copy still accounted for
    let history = library::borrow_history(&pool, tenant, student_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].record.status, BorrowStatus::Borrowed);
    let stored = library::get_book(&pool, tenant, created.id).await.unwrap();
    assert_eq!(stored.total_copies - stored.available_copies, 1);

    library::return_book(&pool, tenant, ReturnRequest { borrow_id: Some(loan.borrow.id) })
        .await
        .unwrap();
    student::delete_student(&pool, tenant, student_id).await.unwrap();

    let stored = library::get_book(&pool, tenant, created.id).await.unwrap();
    assert_eq!(stored.available_copies, 1);
    assert_eq!(stored.status, StockStatus::LowStock);
    assert!(matches!(
        student::delete_student(&pool, tenant, student_id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn concurrent_borrows_never_oversell() {
    let Some(pool) = common::database().await else { return };
    let (_, tenant) = common::provisioned_institute(&pool).await.unwrap();
    let student_id = enrol(&pool, tenant).await;
    let created = library::create_book(&pool, tenant, book("Kindred", 2)).await.unwrap();
    let book_id = created.id;

    let attempts: Vec<_> = (0..5)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                library::borrow_book(
                    &pool,
                    tenant,
                    BorrowRequest { book_id: Some(book_id), student_id: Some(student_id), due_date: None },
                )
                .await
            })
        })
        .collect();

    let (mut lent, mut refused) = (0, 0);
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => lent += 1,
            Err(ServiceError::Capacity(_)) => refused += 1,
            Err(other) => panic!("unexpected borrow error: {other}"),
        }
    }
    assert_eq!((lent, refused), (2, 3));

    let stored = library::get_book(&pool, tenant, created.id).await.unwrap();
    assert_eq!(stored.available_copies, 0);
    assert_eq!(stored.status, StockStatus::OutOfStock);
    assert_eq!(library::borrow_history(&pool, tenant, student_id).await.unwrap().len(), 2);
}

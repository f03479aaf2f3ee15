use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Student;
use crate::database::{EntityTable, TenantId};
use crate::services::{non_blank, required, RequiredFields, ServiceError, DEFAULT_PROFILE_IMAGE};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub student_phone_no: Option<String>,
    pub student_address: Option<String>,
    pub enrolled_date: Option<NaiveDate>,
    pub student_image: Option<String>,
}

pub async fn create_student(pool: &PgPool, tenant: TenantId, student: NewStudent) -> Result<Student, ServiceError> {
    RequiredFields::new()
        .text("firstName", student.first_name.as_deref())
        .text("lastName", student.last_name.as_deref())
        .text("studentPhoneNo", student.student_phone_no.as_deref())
        .text("studentAddress", student.student_address.as_deref())
        .present("enrolledDate", student.enrolled_date.as_ref())
        .finish("Please provide")?;

    let table = EntityTable::Student.table_for(tenant)?;
    let sql = format!(
        r#"
        INSERT INTO {} (first_name, last_name, student_phone_no, student_address, enrolled_date, student_image)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
        table.quoted()
    );

    let created: Student = sqlx::query_as(&sql)
        .bind(required(student.first_name))
        .bind(required(student.last_name))
        .bind(required(student.student_phone_no))
        .bind(required(student.student_address))
        .bind(student.enrolled_date)
        .bind(non_blank(student.student_image).unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string()))
        .fetch_one(pool)
        .await?;

    tracing::info!(tenant = %tenant, student_id = %created.id, "Student created");
    Ok(created)
}

pub async fn list_students(pool: &PgPool, tenant: TenantId) -> Result<Vec<Student>, ServiceError> {
    let table = EntityTable::Student.table_for(tenant)?;
    Ok(
        sqlx::query_as::<_, Student>(&format!("SELECT * FROM {} ORDER BY created_at DESC", table.quoted()))
            .fetch_all(pool)
            .await?,
    )
}

pub async fn get_student(pool: &PgPool, tenant: TenantId, id: Uuid) -> Result<Student, ServiceError> {
    let table = EntityTable::Student.table_for(tenant)?;
    sqlx::query_as::<_, Student>(&format!("SELECT * FROM {} WHERE id = $1", table.quoted()))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Student not found"))
}

/// Remove a student.
///
/// Refused while the student still has books on loan; closed loans go with them.
pub async fn delete_student(pool: &PgPool, tenant: TenantId, id: Uuid) -> Result<(), ServiceError> {
    let students = EntityTable::Student.table_for(tenant)?.quoted();
    let borrows = EntityTable::LibraryBorrow.table_for(tenant)?.quoted();

    let mut tx = pool.begin().await?;

    // Holding the row blocks new borrows for this student until we finish
    sqlx::query_scalar::<_, Uuid>(&format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", students))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Student not found"))?;

    let open_loans: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE student_id = $1 AND status = 'borrowed'",
        borrows
    ))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if open_loans > 0 {
        tracing::debug!(tenant = %tenant, student_id = %id, open_loans, "Student delete refused");
        return Err(ServiceError::validation(format!(
            "Student has {} book(s) on loan; return them before deleting the student",
            open_loans
        )));
    }

    sqlx::query(&format!("DELETE FROM {} WHERE id = $1", students))
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::{Attendance, AttendanceStatus};
use crate::database::{EntityTable, TenantId};
use crate::services::{non_blank, RequiredFields, ServiceError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendance {
    pub student_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub attendance_date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    pub course_id: Option<Uuid>,
}

pub async fn mark_attendance(
    pool: &PgPool,
    tenant: TenantId,
    entry: NewAttendance,
) -> Result<Attendance, ServiceError> {
    RequiredFields::new()
        .present("studentId", entry.student_id.as_ref())
        .present("courseId", entry.course_id.as_ref())
        .present("attendanceDate", entry.attendance_date.as_ref())
        .finish("Please provide")?;

    let table = EntityTable::Attendance.table_for(tenant)?;
    let sql = format!(
        r#"
        INSERT INTO {} (student_id, course_id, attendance_date, status, remarks)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
        table.quoted()
    );

    Ok(sqlx::query_as::<_, Attendance>(&sql)
        .bind(entry.student_id)
        .bind(entry.course_id)
        .bind(entry.attendance_date)
        .bind(entry.status.unwrap_or_default().as_str())
        .bind(non_blank(entry.remarks))
        .fetch_one(pool)
        .await?)
}

pub async fn list_attendance(
    pool: &PgPool,
    tenant: TenantId,
    filter: &AttendanceFilter,
) -> Result<Vec<Attendance>, ServiceError> {
    let table = EntityTable::Attendance.table_for(tenant)?;
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT * FROM {} WHERE TRUE", table.quoted()));

    if let Some(date) = filter.date {
        query.push(" AND attendance_date = ").push_bind(date);
    }
    if let Some(course_id) = filter.course_id {
        query.push(" AND course_id = ").push_bind(course_id);
    }
    query.push(" ORDER BY attendance_date DESC, created_at DESC");

    Ok(query.build_query_as::<Attendance>().fetch_all(pool).await?)
}

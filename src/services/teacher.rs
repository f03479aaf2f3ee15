use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{generate_password, hash_password};
use crate::database::models::{Teacher, TeacherWithCourse};
use crate::database::{EntityTable, TenantId};
use crate::services::mail::{teacher_welcome, Mailer};
use crate::services::{non_blank, required, RequiredFields, ServiceError, DEFAULT_PROFILE_IMAGE};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub teacher_email: Option<String>,
    pub teacher_phone_number: Option<String>,
    pub teacher_experience: Option<String>,
    pub teacher_salary: Option<String>,
    pub teacher_joined_date: Option<NaiveDate>,
    pub course_id: Option<Uuid>,
    pub teacher_photo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTeacher {
    #[serde(flatten)]
    pub teacher: Teacher,
    /// False when the welcome mail could not be handed to the mailer
    pub welcome_mail_sent: bool,
}

/// Create a teacher with a generated password and mail them their credentials.
///
/// A mail failure does not undo the account.
pub async fn create_teacher(
    pool: &PgPool,
    mailer: &dyn Mailer,
    tenant: TenantId,
    teacher: NewTeacher,
) -> Result<CreatedTeacher, ServiceError> {
    RequiredFields::new()
        .text("firstName", teacher.first_name.as_deref())
        .text("lastName", teacher.last_name.as_deref())
        .text("teacherEmail", teacher.teacher_email.as_deref())
        .text("teacherPhoneNumber", teacher.teacher_phone_number.as_deref())
        .text("teacherExperience", teacher.teacher_experience.as_deref())
        .text("teacherSalary", teacher.teacher_salary.as_deref())
        .present("teacherJoinedDate", teacher.teacher_joined_date.as_ref())
        .present("courseId", teacher.course_id.as_ref())
        .finish("Please provide")?;

    let courses = EntityTable::Course.table_for(tenant)?;
    let course_exists: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
        courses.quoted()
    ))
    .bind(teacher.course_id)
    .fetch_one(pool)
    .await?;
    if !course_exists {
        return Err(ServiceError::not_found("Course not found"));
    }

    let plain_password = generate_password();
    let password_hash = hash_password(&plain_password)?;
    let email = required(teacher.teacher_email);

    let table = EntityTable::Teacher.table_for(tenant)?;
    let sql = format!(
        r#"
        INSERT INTO {} (first_name, last_name, teacher_email, teacher_phone_number, teacher_experience,
                        joined_date, salary, teacher_photo, teacher_password, course_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
        table.quoted()
    );

    let created: Teacher = sqlx::query_as(&sql)
        .bind(required(teacher.first_name))
        .bind(required(teacher.last_name))
        .bind(&email)
        .bind(required(teacher.teacher_phone_number))
        .bind(required(teacher.teacher_experience))
        .bind(teacher.teacher_joined_date)
        .bind(required(teacher.teacher_salary))
        .bind(non_blank(teacher.teacher_photo).unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string()))
        .bind(password_hash)
        .bind(teacher.course_id)
        .fetch_one(pool)
        .await?;

    let welcome_mail_sent = match mailer
        .send(teacher_welcome(&email, &plain_password, tenant.value()))
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(tenant = %tenant, teacher_id = %created.id, "Welcome mail not sent: {}", e);
            false
        }
    };

    tracing::info!(tenant = %tenant, teacher_id = %created.id, "Teacher created");
    Ok(CreatedTeacher {
        teacher: created,
        welcome_mail_sent,
    })
}

/// Teachers with the name of their course
pub async fn list_teachers(pool: &PgPool, tenant: TenantId) -> Result<Vec<TeacherWithCourse>, ServiceError> {
    let teachers = EntityTable::Teacher.table_for(tenant)?.quoted();
    let courses = EntityTable::Course.table_for(tenant)?.quoted();
    let sql = format!(
        "SELECT t.*, c.course_name FROM {} AS t LEFT JOIN {} AS c ON t.course_id = c.id ORDER BY t.created_at DESC",
        teachers, courses
    );

    Ok(sqlx::query_as::<_, TeacherWithCourse>(&sql).fetch_all(pool).await?)
}

pub async fn delete_teacher(pool: &PgPool, tenant: TenantId, id: Uuid) -> Result<(), ServiceError> {
    let table = EntityTable::Teacher.table_for(tenant)?;
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table.quoted()))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Teacher not found"));
    }
    Ok(())
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub teacher_email: String,
    pub teacher_phone_number: String,
    pub teacher_experience: Option<String>,
    pub joined_date: Option<NaiveDate>,
    pub salary: Option<String>,
    pub teacher_photo: Option<String>,
    pub course_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Teacher row joined with the name of the course they teach
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeacherWithCourse {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub teacher: Teacher,
    pub course_name: Option<String>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advance,
}

impl CourseLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advance => "advance",
        }
    }
}

impl TryFrom<String> for CourseLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "beginner" => Ok(CourseLevel::Beginner),
            "intermediate" => Ok(CourseLevel::Intermediate),
            "advance" => Ok(CourseLevel::Advance),
            other => Err(format!("unknown course level '{}'", other)),
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub course_name: String,
    pub course_price: String,
    pub course_duration: String,
    #[sqlx(try_from = "String")]
    pub course_level: CourseLevel,
    pub course_thumbnail: Option<String>,
    pub course_description: Option<String>,
    pub teacher_id: Option<Uuid>,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course row joined with its category name
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithCategory {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub course: Course,
    pub category_name: Option<String>,
}

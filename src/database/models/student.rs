use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub student_phone_no: String,
    pub student_address: Option<String>,
    pub enrolled_date: Option<NaiveDate>,
    pub student_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

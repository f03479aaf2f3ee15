use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Institute metadata from the shared `institutes` catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Institute {
    pub id: Uuid,
    pub institute_number: i64,
    pub institute_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub pan_no: Option<String>,
    pub vat_no: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

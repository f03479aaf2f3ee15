use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub category_name: String,
    pub category_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Categories seeded into every new institute
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Development", "Programming, software engineering and web development courses"),
    ("Design", "Graphic, UI/UX and product design courses"),
    ("Business", "Management, entrepreneurship and finance courses"),
    ("Marketing", "Digital marketing, branding and communication courses"),
    ("Science", "Physics, chemistry, biology and mathematics courses"),
    ("Language", "Language learning and literature courses"),
];

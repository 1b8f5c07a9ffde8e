use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: i32,
    pub img: Option<String>,
    pub school: String,
    pub degree: String,
    pub date: String,
    pub desc: Option<String>,
    pub grade: Option<String>,
    pub doc: Option<String>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEducation {
    pub img: Option<String>,
    pub school: String,
    pub degree: String,
    pub date: String,
    pub desc: Option<String>,
    pub grade: Option<String>,
    pub doc: Option<String>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EducationChanges {
    pub img: Option<String>,
    pub school: Option<String>,
    pub degree: Option<String>,
    pub date: Option<String>,
    pub desc: Option<String>,
    pub grade: Option<String>,
    pub doc: Option<String>,
}

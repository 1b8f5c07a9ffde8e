use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: i32,
    pub img: Option<String>,
    pub role: String,
    pub company: String,
    pub date: String,
    pub desc: String,
    pub skills: Vec<String>,
    pub doc: Option<String>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExperience {
    pub img: Option<String>,
    pub role: String,
    pub company: String,
    pub date: String,
    pub desc: String,
    pub skills: Vec<String>,
    pub doc: Option<String>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperienceChanges {
    pub img: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub date: Option<String>,
    pub desc: Option<String>,
    pub skills: Option<Vec<String>>,
    pub doc: Option<String>,
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub github: Option<String>,
    pub webapp: Option<String>,
}

/// A team member. Only ever written through its owning project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub img: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    #[sqlx(rename = "projectId")]
    pub project_id: i32,
}

/// A project joined with its members, serialized as one flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectWithMembers {
    #[serde(flatten)]
    pub project: Project,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub github: Option<String>,
    pub webapp: Option<String>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub github: Option<String>,
    pub webapp: Option<String>,
}

/// One element of the `member` JSON array in a project submission.
/// Elements carrying an `id` update that member; the rest are inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInput {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

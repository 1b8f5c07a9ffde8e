//! Persistence boundary for portfolio entities.
//!
//! `PgStore` is the production implementation. Handlers only see
//! `Arc<dyn PortfolioStore>` from `AppState`.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::education::{Education, EducationChanges, NewEducation};
use crate::models::experience::{Experience, ExperienceChanges, NewExperience};
use crate::models::project::{MemberInput, NewProject, ProjectChanges, ProjectWithMembers};

pub use postgres::PgStore;

/// CRUD per entity kind. Lookups and deletes by id return `None` when no row
/// matches; deletes hand back the removed record so callers can clean up its
/// image.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn create_experience(&self, input: &NewExperience) -> Result<Experience, sqlx::Error>;
    async fn list_experiences(&self) -> Result<Vec<Experience>, sqlx::Error>;
    async fn find_experience(&self, id: i32) -> Result<Option<Experience>, sqlx::Error>;
    async fn update_experience(
        &self,
        id: i32,
        changes: &ExperienceChanges,
    ) -> Result<Option<Experience>, sqlx::Error>;
    async fn delete_experience(&self, id: i32) -> Result<Option<Experience>, sqlx::Error>;

    async fn create_education(&self, input: &NewEducation) -> Result<Education, sqlx::Error>;
    async fn list_education(&self) -> Result<Vec<Education>, sqlx::Error>;
    async fn find_education(&self, id: i32) -> Result<Option<Education>, sqlx::Error>;
    async fn update_education(
        &self,
        id: i32,
        changes: &EducationChanges,
    ) -> Result<Option<Education>, sqlx::Error>;
    async fn delete_education(&self, id: i32) -> Result<Option<Education>, sqlx::Error>;

    /// Inserts the project and its members atomically.
    async fn create_project(
        &self,
        input: &NewProject,
        members: &[MemberInput],
    ) -> Result<ProjectWithMembers, sqlx::Error>;
    async fn list_projects(&self) -> Result<Vec<ProjectWithMembers>, sqlx::Error>;
    async fn find_project(&self, id: i32) -> Result<Option<ProjectWithMembers>, sqlx::Error>;
    /// Applies field changes, updates members that carry an id and inserts
    /// the rest. Members absent from `members` are left in place.
    async fn update_project(
        &self,
        id: i32,
        changes: &ProjectChanges,
        members: &[MemberInput],
    ) -> Result<Option<ProjectWithMembers>, sqlx::Error>;
    /// Removes the project and all of its members atomically.
    async fn delete_project(&self, id: i32) -> Result<Option<ProjectWithMembers>, sqlx::Error>;
    /// Removes every member and project. Returns the number of projects removed.
    async fn delete_all_projects(&self) -> Result<u64, sqlx::Error>;
}

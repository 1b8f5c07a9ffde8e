//! PostgreSQL implementation of `PortfolioStore`.
//!
//! Table and column names follow the Prisma-generated schema, hence the quoted
//! identifiers. Partial updates bind every field and let
//! `COALESCE($n, column)` keep the stored value for the ones left `NULL`.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

use crate::models::education::{Education, EducationChanges, NewEducation};
use crate::models::experience::{Experience, ExperienceChanges, NewExperience};
use crate::models::project::{
    Member, MemberInput, NewProject, Project, ProjectChanges, ProjectWithMembers,
};
use crate::store::PortfolioStore;

// Timestamps are stored as zone-less UTC (Prisma `DateTime`), so they are
// tagged with UTC on the way out and written as UTC wall-clock time.
const EXPERIENCE_COLUMNS: &str = r#"id, img, role, company, date, "desc", skills, doc,
    "createdAt" AT TIME ZONE 'UTC' AS "createdAt",
    "updatedAt" AT TIME ZONE 'UTC' AS "updatedAt""#;
const EDUCATION_COLUMNS: &str = r#"id, img, school, degree, date, "desc", grade, doc,
    "createdAt" AT TIME ZONE 'UTC' AS "createdAt",
    "updatedAt" AT TIME ZONE 'UTC' AS "updatedAt""#;
const UTC_NOW: &str = "(NOW() AT TIME ZONE 'UTC')";
const PROJECT_COLUMNS: &str = "id, title, description, image, date, category, github, webapp";
const MEMBER_COLUMNS: &str = r#"id, name, img, linkedin, github, "projectId""#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PortfolioStore for PgStore {
    async fn create_experience(&self, input: &NewExperience) -> Result<Experience, sqlx::Error> {
        let query = format!(
            r#"INSERT INTO "Experience" (img, role, company, date, "desc", skills, doc, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5, $6, $7, {UTC_NOW}, {UTC_NOW})
               RETURNING {EXPERIENCE_COLUMNS}"#
        );
        sqlx::query_as::<_, Experience>(&query)
            .bind(&input.img)
            .bind(&input.role)
            .bind(&input.company)
            .bind(&input.date)
            .bind(&input.desc)
            .bind(&input.skills)
            .bind(&input.doc)
            .fetch_one(&self.pool)
            .await
    }

    async fn list_experiences(&self) -> Result<Vec<Experience>, sqlx::Error> {
        let query = format!(r#"SELECT {EXPERIENCE_COLUMNS} FROM "Experience" ORDER BY id"#);
        sqlx::query_as::<_, Experience>(&query)
            .fetch_all(&self.pool)
            .await
    }

    async fn find_experience(&self, id: i32) -> Result<Option<Experience>, sqlx::Error> {
        let query = format!(r#"SELECT {EXPERIENCE_COLUMNS} FROM "Experience" WHERE id = $1"#);
        sqlx::query_as::<_, Experience>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_experience(
        &self,
        id: i32,
        changes: &ExperienceChanges,
    ) -> Result<Option<Experience>, sqlx::Error> {
        let query = format!(
            r#"UPDATE "Experience" SET
                   img = COALESCE($2, img),
                   role = COALESCE($3, role),
                   company = COALESCE($4, company),
                   date = COALESCE($5, date),
                   "desc" = COALESCE($6, "desc"),
                   skills = COALESCE($7, skills),
                   doc = COALESCE($8, doc),
                   "updatedAt" = {UTC_NOW}
               WHERE id = $1
               RETURNING {EXPERIENCE_COLUMNS}"#
        );
        sqlx::query_as::<_, Experience>(&query)
            .bind(id)
            .bind(&changes.img)
            .bind(&changes.role)
            .bind(&changes.company)
            .bind(&changes.date)
            .bind(&changes.desc)
            .bind(&changes.skills)
            .bind(&changes.doc)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_experience(&self, id: i32) -> Result<Option<Experience>, sqlx::Error> {
        let query =
            format!(r#"DELETE FROM "Experience" WHERE id = $1 RETURNING {EXPERIENCE_COLUMNS}"#);
        sqlx::query_as::<_, Experience>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_education(&self, input: &NewEducation) -> Result<Education, sqlx::Error> {
        let query = format!(
            r#"INSERT INTO "Education" (img, school, degree, date, "desc", grade, doc, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5, $6, $7, {UTC_NOW}, {UTC_NOW})
               RETURNING {EDUCATION_COLUMNS}"#
        );
        sqlx::query_as::<_, Education>(&query)
            .bind(&input.img)
            .bind(&input.school)
            .bind(&input.degree)
            .bind(&input.date)
            .bind(&input.desc)
            .bind(&input.grade)
            .bind(&input.doc)
            .fetch_one(&self.pool)
            .await
    }

    async fn list_education(&self) -> Result<Vec<Education>, sqlx::Error> {
        let query = format!(r#"SELECT {EDUCATION_COLUMNS} FROM "Education" ORDER BY id"#);
        sqlx::query_as::<_, Education>(&query)
            .fetch_all(&self.pool)
            .await
    }

    async fn find_education(&self, id: i32) -> Result<Option<Education>, sqlx::Error> {
        let query = format!(r#"SELECT {EDUCATION_COLUMNS} FROM "Education" WHERE id = $1"#);
        sqlx::query_as::<_, Education>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_education(
        &self,
        id: i32,
        changes: &EducationChanges,
    ) -> Result<Option<Education>, sqlx::Error> {
        let query = format!(
            r#"UPDATE "Education" SET
                   img = COALESCE($2, img),
                   school = COALESCE($3, school),
                   degree = COALESCE($4, degree),
                   date = COALESCE($5, date),
                   "desc" = COALESCE($6, "desc"),
                   grade = COALESCE($7, grade),
                   doc = COALESCE($8, doc),
                   "updatedAt" = {UTC_NOW}
               WHERE id = $1
               RETURNING {EDUCATION_COLUMNS}"#
        );
        sqlx::query_as::<_, Education>(&query)
            .bind(id)
            .bind(&changes.img)
            .bind(&changes.school)
            .bind(&changes.degree)
            .bind(&changes.date)
            .bind(&changes.desc)
            .bind(&changes.grade)
            .bind(&changes.doc)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_education(&self, id: i32) -> Result<Option<Education>, sqlx::Error> {
        let query =
            format!(r#"DELETE FROM "Education" WHERE id = $1 RETURNING {EDUCATION_COLUMNS}"#);
        sqlx::query_as::<_, Education>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_project(
        &self,
        input: &NewProject,
        members: &[MemberInput],
    ) -> Result<ProjectWithMembers, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"INSERT INTO "Project" (title, description, image, date, category, github, webapp)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {PROJECT_COLUMNS}"#
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.image)
            .bind(&input.date)
            .bind(&input.category)
            .bind(&input.github)
            .bind(&input.webapp)
            .fetch_one(&mut *tx)
            .await?;

        let members = insert_members(&mut tx, project.id, members).await?;
        tx.commit().await?;

        Ok(ProjectWithMembers { project, members })
    }

    async fn list_projects(&self) -> Result<Vec<ProjectWithMembers>, sqlx::Error> {
        let query = format!(r#"SELECT {PROJECT_COLUMNS} FROM "Project" ORDER BY id"#);
        let projects = sqlx::query_as::<_, Project>(&query)
            .fetch_all(&self.pool)
            .await?;

        let query = format!(r#"SELECT {MEMBER_COLUMNS} FROM "Member" ORDER BY id"#);
        let members = sqlx::query_as::<_, Member>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(join_members(projects, members))
    }

    async fn find_project(&self, id: i32) -> Result<Option<ProjectWithMembers>, sqlx::Error> {
        let query = format!(r#"SELECT {PROJECT_COLUMNS} FROM "Project" WHERE id = $1"#);
        let Some(project) = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let members = members_of(&mut conn, id).await?;
        Ok(Some(ProjectWithMembers { project, members }))
    }

    async fn update_project(
        &self,
        id: i32,
        changes: &ProjectChanges,
        members: &[MemberInput],
    ) -> Result<Option<ProjectWithMembers>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"UPDATE "Project" SET
                   title = COALESCE($2, title),
                   description = COALESCE($3, description),
                   image = COALESCE($4, image),
                   date = COALESCE($5, date),
                   category = COALESCE($6, category),
                   github = COALESCE($7, github),
                   webapp = COALESCE($8, webapp)
               WHERE id = $1
               RETURNING {PROJECT_COLUMNS}"#
        );
        let Some(project) = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.image)
            .bind(&changes.date)
            .bind(&changes.category)
            .bind(&changes.github)
            .bind(&changes.webapp)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut additions = Vec::new();
        for member in members {
            match member.id {
                Some(member_id) => {
                    let result = sqlx::query(
                        r#"UPDATE "Member"
                           SET name = $1, img = $2, linkedin = $3, github = $4
                           WHERE id = $5 AND "projectId" = $6"#,
                    )
                    .bind(&member.name)
                    .bind(&member.img)
                    .bind(&member.linkedin)
                    .bind(&member.github)
                    .bind(member_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                    if result.rows_affected() == 0 {
                        warn!("Ignoring member {member_id}: not part of project {id}");
                    }
                }
                None => additions.push(member.clone()),
            }
        }
        insert_members(&mut tx, id, &additions).await?;

        let members = members_of(&mut tx, id).await?;
        tx.commit().await?;

        Ok(Some(ProjectWithMembers { project, members }))
    }

    async fn delete_project(&self, id: i32) -> Result<Option<ProjectWithMembers>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"DELETE FROM "Member" WHERE "projectId" = $1 RETURNING {MEMBER_COLUMNS}"#
        );
        let mut members = sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let query = format!(r#"DELETE FROM "Project" WHERE id = $1 RETURNING {PROJECT_COLUMNS}"#);
        let Some(project) = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            // Dropping the transaction rolls it back.
            return Ok(None);
        };

        tx.commit().await?;
        members.sort_by_key(|m| m.id);
        Ok(Some(ProjectWithMembers { project, members }))
    }

    async fn delete_all_projects(&self) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let members = sqlx::query(r#"DELETE FROM "Member""#)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let projects = sqlx::query(r#"DELETE FROM "Project""#)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        info!("Deleted {projects} projects and {members} members");
        Ok(projects)
    }
}

/// Bulk-inserts members for `project_id` in a single statement.
async fn insert_members(
    conn: &mut PgConnection,
    project_id: i32,
    members: &[MemberInput],
) -> Result<Vec<Member>, sqlx::Error> {
    if members.is_empty() {
        return Ok(Vec::new());
    }

    let names: Vec<String> = members.iter().map(|m| m.name.clone()).collect();
    let imgs: Vec<Option<String>> = members.iter().map(|m| m.img.clone()).collect();
    let linkedins: Vec<Option<String>> = members.iter().map(|m| m.linkedin.clone()).collect();
    let githubs: Vec<Option<String>> = members.iter().map(|m| m.github.clone()).collect();

    let query = format!(
        r#"INSERT INTO "Member" (name, img, linkedin, github, "projectId")
           SELECT m.name, m.img, m.linkedin, m.github, $5
           FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[])
               AS m(name, img, linkedin, github)
           RETURNING {MEMBER_COLUMNS}"#
    );
    let mut inserted = sqlx::query_as::<_, Member>(&query)
        .bind(&names)
        .bind(&imgs)
        .bind(&linkedins)
        .bind(&githubs)
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?;
    inserted.sort_by_key(|m| m.id);
    Ok(inserted)
}

async fn members_of(conn: &mut PgConnection, project_id: i32) -> Result<Vec<Member>, sqlx::Error> {
    let query =
        format!(r#"SELECT {MEMBER_COLUMNS} FROM "Member" WHERE "projectId" = $1 ORDER BY id"#);
    sqlx::query_as::<_, Member>(&query)
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await
}

/// Groups members under their projects, keeping both in id order.
fn join_members(projects: Vec<Project>, members: Vec<Member>) -> Vec<ProjectWithMembers> {
    let mut by_project: HashMap<i32, Vec<Member>> = HashMap::new();
    for member in members {
        by_project.entry(member.project_id).or_default().push(member);
    }
    projects
        .into_iter()
        .map(|project| ProjectWithMembers {
            members: by_project.remove(&project.id).unwrap_or_default(),
            project,
        })
        .collect()
}

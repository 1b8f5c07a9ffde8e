//! In-memory `PortfolioStore` for tests. Mirrors the Postgres semantics:
//! id order, COALESCE-style partial updates, additive member updates scoped to
//! the owning project, and all-or-nothing project writes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::education::{Education, EducationChanges, NewEducation};
use crate::models::experience::{Experience, ExperienceChanges, NewExperience};
use crate::models::project::{
    Member, MemberInput, NewProject, Project, ProjectChanges, ProjectWithMembers,
};
use crate::store::PortfolioStore;

#[derive(Default)]
struct Tables {
    next_id: i32,
    experiences: BTreeMap<i32, Experience>,
    education: BTreeMap<i32, Education>,
    projects: BTreeMap<i32, Project>,
    members: BTreeMap<i32, Member>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn members_of(&self, project_id: i32) -> Vec<Member> {
        self.members
            .values()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect()
    }

    fn joined(&self, project: &Project) -> ProjectWithMembers {
        ProjectWithMembers {
            project: project.clone(),
            members: self.members_of(project.id),
        }
    }

    fn insert_member(&mut self, project_id: i32, input: &MemberInput) {
        let id = self.next_id();
        self.members.insert(
            id,
            Member {
                id,
                name: input.name.clone(),
                img: input.img.clone(),
                linkedin: input.linkedin.clone(),
                github: input.github.clone(),
                project_id,
            },
        );
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Makes every subsequent write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn member_count(&self) -> usize {
        self.tables.lock().unwrap().members.len()
    }

    fn check_writable(&self) -> Result<(), sqlx::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("injected write failure".into()));
        }
        Ok(())
    }
}

fn merge(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        target.clone_from(v);
    }
}

fn merge_opt(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn create_experience(&self, input: &NewExperience) -> Result<Experience, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let now = Utc::now();
        let record = Experience {
            id,
            img: input.img.clone(),
            role: input.role.clone(),
            company: input.company.clone(),
            date: input.date.clone(),
            desc: input.desc.clone(),
            skills: input.skills.clone(),
            doc: input.doc.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.experiences.insert(id, record.clone());
        Ok(record)
    }

    async fn list_experiences(&self) -> Result<Vec<Experience>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().experiences.values().cloned().collect())
    }

    async fn find_experience(&self, id: i32) -> Result<Option<Experience>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().experiences.get(&id).cloned())
    }

    async fn update_experience(
        &self,
        id: i32,
        changes: &ExperienceChanges,
    ) -> Result<Option<Experience>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(record) = tables.experiences.get_mut(&id) else {
            return Ok(None);
        };
        merge_opt(&mut record.img, &changes.img);
        merge(&mut record.role, &changes.role);
        merge(&mut record.company, &changes.company);
        merge(&mut record.date, &changes.date);
        merge(&mut record.desc, &changes.desc);
        if let Some(skills) = &changes.skills {
            record.skills.clone_from(skills);
        }
        merge_opt(&mut record.doc, &changes.doc);
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_experience(&self, id: i32) -> Result<Option<Experience>, sqlx::Error> {
        self.check_writable()?;
        Ok(self.tables.lock().unwrap().experiences.remove(&id))
    }

    async fn create_education(&self, input: &NewEducation) -> Result<Education, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let now = Utc::now();
        let record = Education {
            id,
            img: input.img.clone(),
            school: input.school.clone(),
            degree: input.degree.clone(),
            date: input.date.clone(),
            desc: input.desc.clone(),
            grade: input.grade.clone(),
            doc: input.doc.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.education.insert(id, record.clone());
        Ok(record)
    }

    async fn list_education(&self) -> Result<Vec<Education>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().education.values().cloned().collect())
    }

    async fn find_education(&self, id: i32) -> Result<Option<Education>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().education.get(&id).cloned())
    }

    async fn update_education(
        &self,
        id: i32,
        changes: &EducationChanges,
    ) -> Result<Option<Education>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(record) = tables.education.get_mut(&id) else {
            return Ok(None);
        };
        merge_opt(&mut record.img, &changes.img);
        merge(&mut record.school, &changes.school);
        merge(&mut record.degree, &changes.degree);
        merge(&mut record.date, &changes.date);
        merge_opt(&mut record.desc, &changes.desc);
        merge_opt(&mut record.grade, &changes.grade);
        merge_opt(&mut record.doc, &changes.doc);
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_education(&self, id: i32) -> Result<Option<Education>, sqlx::Error> {
        self.check_writable()?;
        Ok(self.tables.lock().unwrap().education.remove(&id))
    }

    async fn create_project(
        &self,
        input: &NewProject,
        members: &[MemberInput],
    ) -> Result<ProjectWithMembers, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let project = Project {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            image: input.image.clone(),
            date: input.date.clone(),
            category: input.category.clone(),
            github: input.github.clone(),
            webapp: input.webapp.clone(),
        };
        tables.projects.insert(id, project.clone());
        for member in members {
            tables.insert_member(id, member);
        }
        Ok(tables.joined(&project))
    }

    async fn list_projects(&self) -> Result<Vec<ProjectWithMembers>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.projects.values().map(|p| tables.joined(p)).collect())
    }

    async fn find_project(&self, id: i32) -> Result<Option<ProjectWithMembers>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.projects.get(&id).map(|p| tables.joined(p)))
    }

    async fn update_project(
        &self,
        id: i32,
        changes: &ProjectChanges,
        members: &[MemberInput],
    ) -> Result<Option<ProjectWithMembers>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(project) = tables.projects.get_mut(&id) else {
            return Ok(None);
        };
        merge(&mut project.title, &changes.title);
        merge_opt(&mut project.description, &changes.description);
        merge_opt(&mut project.image, &changes.image);
        merge_opt(&mut project.date, &changes.date);
        merge_opt(&mut project.category, &changes.category);
        merge_opt(&mut project.github, &changes.github);
        merge_opt(&mut project.webapp, &changes.webapp);
        let project = project.clone();

        for input in members {
            match input.id {
                Some(member_id) => {
                    if let Some(member) = tables
                        .members
                        .get_mut(&member_id)
                        .filter(|m| m.project_id == id)
                    {
                        member.name.clone_from(&input.name);
                        member.img.clone_from(&input.img);
                        member.linkedin.clone_from(&input.linkedin);
                        member.github.clone_from(&input.github);
                    }
                }
                None => tables.insert_member(id, input),
            }
        }
        Ok(Some(tables.joined(&project)))
    }

    async fn delete_project(&self, id: i32) -> Result<Option<ProjectWithMembers>, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(project) = tables.projects.remove(&id) else {
            return Ok(None);
        };
        let members = tables.members_of(id);
        tables.members.retain(|_, m| m.project_id != id);
        Ok(Some(ProjectWithMembers { project, members }))
    }

    async fn delete_all_projects(&self) -> Result<u64, sqlx::Error> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let removed = tables.projects.len() as u64;
        tables.members.clear();
        tables.projects.clear();
        Ok(removed)
    }
}

//! Project and work-session lifecycles on top of the persistence gateway.
//!
//! [`Tracker`] is what a front end talks to. It owns the [`Database`] and
//! hands out short-lived [`ProjectLifecycle`] and [`SessionLifecycle`]
//! managers that borrow it.

mod projects;
mod sessions;

pub use projects::ProjectLifecycle;
pub use sessions::{SessionLifecycle, SlotState};

use std::path::Path;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ActiveSession, Project, WorkSession};

pub struct Tracker {
    db: Database,
}

impl Tracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the store at `path` and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::open(path)?;
        db.initialize_schema()?;
        Ok(Self::new(db))
    }

    pub fn open_memory() -> Result<Self> {
        let db = Database::open_memory()?;
        db.initialize_schema()?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn projects(&self) -> ProjectLifecycle<'_> {
        ProjectLifecycle::new(&self.db)
    }

    pub fn sessions(&self) -> SessionLifecycle<'_> {
        SessionLifecycle::new(&self.db)
    }

    // ============================================================
    // Projects
    // ============================================================

    pub fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        self.projects().create(name, description)
    }

    pub fn load_project(&self, id: i64) -> Result<Project> {
        self.projects().load(id)
    }

    pub fn rename_project(&self, id: i64, new_name: &str) -> Result<Project> {
        let mut project = self.find_project(id)?;
        self.projects().rename(&mut project, new_name)?;
        Ok(project)
    }

    pub fn set_description(&self, id: i64, text: &str) -> Result<Project> {
        let mut project = self.find_project(id)?;
        self.projects().set_description(&mut project, text)?;
        Ok(project)
    }

    pub fn archive_project(&self, id: i64) -> Result<Project> {
        let mut project = self.find_project(id)?;
        self.projects().archive(&mut project)?;
        Ok(project)
    }

    pub fn list_active_projects(&self) -> Result<Vec<Project>> {
        self.db.list_active_projects()
    }

    pub fn list_all_projects(&self) -> Result<Vec<Project>> {
        self.db.list_all_projects()
    }

    fn find_project(&self, id: i64) -> Result<Project> {
        self.db
            .get_project(id)?
            .ok_or_else(|| Error::project_not_found(id))
    }

    // ============================================================
    // Work sessions
    // ============================================================

    pub fn start_session(&self, project_id: i64, description: Option<&str>) -> Result<WorkSession> {
        self.sessions().start(project_id, description)
    }

    pub fn stop_session(&self) -> Result<WorkSession> {
        self.sessions().stop()
    }

    pub fn list_sessions_for_project(&self, project_id: i64) -> Result<Vec<WorkSession>> {
        self.sessions().list_for_project(project_id)
    }

    pub fn get_active_session(&self) -> Result<Option<ActiveSession>> {
        self.db.get_active_session()
    }
}

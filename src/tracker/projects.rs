use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::Project;

use super::sessions::{SessionLifecycle, SlotState};

/// Creates and edits projects. Every change is written immediately; when the
/// write fails the in-memory change is undone so entity and row agree.
pub struct ProjectLifecycle<'a> {
    db: &'a Database,
}

impl<'a> ProjectLifecycle<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, name: &str, description: &str) -> Result<Project> {
        let mut project = Project::new(name, description)?;
        self.db.save_new_project(&mut project)?;
        tracing::info!("Created project {:?} ({})", project.id, project.name);
        Ok(project)
    }

    /// A stored project with its sessions loaded.
    pub fn load(&self, id: i64) -> Result<Project> {
        let mut project = self
            .db
            .get_project(id)?
            .ok_or_else(|| Error::project_not_found(id))?;
        self.db.load_sessions(&mut project)?;
        Ok(project)
    }

    pub fn rename(&self, project: &mut Project, new_name: &str) -> Result<()> {
        let previous = project.name.clone();
        project.rename(new_name)?;
        if let Err(e) = self.db.update_project(project) {
            project.name = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn set_description(&self, project: &mut Project, text: &str) -> Result<()> {
        let previous = project.description.clone();
        project.set_description(text)?;
        if let Err(e) = self.db.update_project(project) {
            project.description = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Archive the project. Archiving an archived project again succeeds.
    ///
    /// The flag is always written, so an entity already flagged in memory
    /// still ends up archived in storage. A project that owns the running
    /// session cannot be archived; the session has to be stopped first.
    pub fn archive(&self, project: &mut Project) -> Result<()> {
        if let SlotState::Running(active) = SessionLifecycle::new(self.db).state()? {
            if project.id == Some(active.session.project_id) {
                tracing::warn!("Refusing to archive project {:?}: it has a running session", project.id);
                return Err(Error::Conflict(format!(
                    "Project '{}' has a running work session; stop it before archiving",
                    project.name
                )));
            }
        }

        let previous = project.archived;
        project.archive();
        if let Err(e) = self.db.update_project(project) {
            project.archived = previous;
            return Err(e);
        }

        tracing::info!("Archived project {:?} ({})", project.id, project.name);
        Ok(())
    }
}

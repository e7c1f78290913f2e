use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{ActiveSession, Project, WorkSession};

/// The store-wide slot for the running work session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Running(ActiveSession),
}

/// Starts and stops work sessions while keeping at most one running.
///
/// The slot state is read from storage on every call and never cached, so
/// nothing done elsewhere can leave this manager with a stale view.
pub struct SessionLifecycle<'a> {
    db: &'a Database,
}

impl<'a> SessionLifecycle<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn state(&self) -> Result<SlotState> {
        Ok(match self.db.get_active_session()? {
            Some(active) => SlotState::Running(active),
            None => SlotState::Idle,
        })
    }

    /// Start a session on `project_id`.
    ///
    /// Fails with [`Error::Conflict`] while any session is running or when the
    /// project is archived, and with [`Error::NotFound`] for an unknown project.
    pub fn start(&self, project_id: i64, description: Option<&str>) -> Result<WorkSession> {
        if let SlotState::Running(active) = self.state()? {
            tracing::warn!(
                "Refusing to start a session on project {}: session {:?} is running",
                project_id,
                active.session.id
            );
            return Err(Error::Conflict(format!(
                "A work session is already running for project '{}' (id {})",
                active.project_name, active.session.project_id
            )));
        }

        let project = self
            .db
            .get_project(project_id)?
            .ok_or_else(|| Error::project_not_found(project_id))?;
        if project.archived {
            tracing::warn!("Refusing to start a session on archived project {}", project_id);
            return Err(Error::Conflict(format!(
                "Project '{}' is archived",
                project.name
            )));
        }

        let mut session = WorkSession::start(project_id, description);
        self.db.save_new_session(&mut session)?;

        tracing::info!(
            "Started work session {:?} on project {} ({})",
            session.id,
            project_id,
            project.name
        );
        Ok(session)
    }

    /// Stop the running session and return it with its end time set.
    pub fn stop(&self) -> Result<WorkSession> {
        let SlotState::Running(active) = self.state()? else {
            return Err(Error::NoActiveSession);
        };

        let mut session = active.session;
        session.end();
        self.db.update_session(&session)?;

        tracing::info!(
            "Stopped work session {:?} on project {} after {}",
            session.id,
            session.project_id,
            session.elapsed()
        );
        Ok(session)
    }

    /// Like [`start`](Self::start), and appends the new session to `project`.
    pub fn start_in(&self, project: &mut Project, description: Option<&str>) -> Result<WorkSession> {
        let project_id = project
            .id
            .ok_or_else(|| Error::Validation("Project has not been saved yet".into()))?;
        let session = self.start(project_id, description)?;
        project.add_session(session.clone());
        Ok(session)
    }

    /// Like [`stop`](Self::stop), and updates the session in `project` when
    /// it belongs there.
    pub fn stop_in(&self, project: &mut Project) -> Result<WorkSession> {
        let session = self.stop()?;
        if project.id == Some(session.project_id) {
            project.record_session(session.clone());
        }
        Ok(session)
    }

    pub fn list_for_project(&self, project_id: i64) -> Result<Vec<WorkSession>> {
        if self.db.get_project(project_id)?.is_none() {
            return Err(Error::project_not_found(project_id));
        }
        self.db.list_sessions_for_project(project_id)
    }
}

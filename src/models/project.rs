use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use super::duration::format_duration;
use super::session::WorkSession;
use crate::error::{Error, Result};

/// Longest accepted project name, in characters.
pub const MAX_NAME_LENGTH: usize = 100;
/// Longest accepted project description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// A project that work sessions are booked against.
///
/// Projects are never physically deleted. Archiving hides a project from the
/// active listing but keeps all of its sessions. The `sessions` collection is
/// only populated when loaded explicitly (see
/// [`Database::load_sessions`](crate::db::Database::load_sessions)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Row id, assigned when the project is first saved.
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub archived: bool,
    #[serde(default)]
    pub sessions: Vec<WorkSession>,
}

impl Project {
    pub fn new(name: &str, description: &str) -> Result<Self> {
        let mut project = Self {
            id: None,
            name: String::new(),
            description: String::new(),
            archived: false,
            sessions: Vec::new(),
        };
        project.rename(name)?;
        project.set_description(description)?;
        Ok(project)
    }

    /// Change the name in memory. The caller persists it.
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Project name must not be empty".into()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Project name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }
        self.name = name.to_string();
        Ok(())
    }

    /// Change the description in memory. Empty is allowed.
    pub fn set_description(&mut self, description: &str) -> Result<()> {
        let description = description.trim();
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::Validation(format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }
        self.description = description.to_string();
        Ok(())
    }

    /// Mark as archived. Archiving twice is a no-op.
    pub fn archive(&mut self) {
        self.archived = true;
    }

    /// Append a session, re-pointing it at this project when the ids differ.
    pub fn add_session(&mut self, mut session: WorkSession) {
        if let Some(id) = self.id {
            if session.project_id != id {
                session.project_id = id;
            }
        }
        self.sessions.push(session);
    }

    /// Replace the session with the same id, or append it if not present.
    pub fn record_session(&mut self, session: WorkSession) {
        let existing = session
            .id
            .and_then(|id| self.sessions.iter_mut().find(|s| s.id == Some(id)));
        match existing {
            Some(slot) => *slot = session,
            None => self.add_session(session),
        }
    }

    pub fn active_session(&self) -> Option<&WorkSession> {
        self.sessions.iter().find(|s| s.is_active())
    }

    /// Total time of all ended sessions. The running session is not counted.
    pub fn total_duration(&self) -> TimeDelta {
        self.sessions
            .iter()
            .filter(|s| !s.is_active())
            .map(|s| s.duration())
            .fold(TimeDelta::zero(), |acc, d| acc + d)
    }

    pub fn total_duration_label(&self) -> String {
        format_duration(self.total_duration())
    }
}

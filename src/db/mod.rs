//! The persistence gateway.
//!
//! [`Database`] is the only owner of the SQLite connection. Every mutating
//! call runs in its own transaction and is committed before it returns; when
//! a call fails nothing is written and the entity passed in is left as it was.

mod schema;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};

use crate::error::{Error, Result};
use crate::models::*;

/// Timestamps are stored as ISO-8601 local wall-clock text, whole seconds.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const APP_NAME: &str = "timetrack";
const DB_FILE: &str = "timetrack.db";

const SESSION_COLUMNS: &str = "id, project_id, start_time, end_time, description";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    /// Open `timetrack.db` in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(data_dir()?.join(DB_FILE))
    }

    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Create the tables if they do not exist yet. Safe on every startup.
    pub fn initialize_schema(&self) -> Result<()> {
        schema::run_migrations(&self.conn)
    }

    /// Run `f` in a single transaction. Writes made by gateway calls inside
    /// `f` join it instead of committing on their own, so either all of them
    /// land or none do. Ids assigned to entities are not reset on rollback.
    pub fn atomically<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run one mutation in its own transaction, or in the caller's when
    /// [`atomically`](Self::atomically) already opened one.
    fn write<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        if !self.conn.is_autocommit() {
            return Ok(f(&self.conn)?);
        }
        let tx = self.conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ============================================================
    // Project operations
    // ============================================================

    /// Insert a new project and assign the generated id to it.
    pub fn save_new_project(&self, project: &mut Project) -> Result<i64> {
        if let Some(id) = project.id {
            return Err(Error::Validation(format!("Project {} is already saved", id)));
        }

        let id = self.write(|conn| {
            conn.execute(
                "INSERT INTO projects (name, description, archived) VALUES (?, ?, ?)",
                (&project.name, &project.description, project.archived),
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        project.id = Some(id);
        tracing::debug!("Saved project {} ({})", id, project.name);
        Ok(id)
    }

    /// Write name, description and archived flag. A missing row is not an error.
    pub fn update_project(&self, project: &Project) -> Result<()> {
        let id = project
            .id
            .ok_or_else(|| Error::Validation("Project has not been saved yet".into()))?;

        let rows = self.write(|conn| {
            conn.execute(
                "UPDATE projects SET name = ?, description = ?, archived = ? WHERE id = ?",
                (&project.name, &project.description, project.archived, id),
            )
        })?;

        tracing::debug!("Updated project {} ({} row(s))", id, rows);
        Ok(())
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, archived FROM projects WHERE id = ?")?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(project_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Projects that are not archived, oldest first.
    pub fn list_active_projects(&self) -> Result<Vec<Project>> {
        self.query_projects(
            "SELECT id, name, description, archived FROM projects
             WHERE archived = 0 ORDER BY id",
        )
    }

    /// Every project including archived ones, oldest first.
    pub fn list_all_projects(&self) -> Result<Vec<Project>> {
        self.query_projects("SELECT id, name, description, archived FROM projects ORDER BY id")
    }

    fn query_projects(&self, sql: &str) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(sql)?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    // ============================================================
    // Work session operations
    // ============================================================

    /// Insert a new session and assign the generated id to it.
    ///
    /// This does not check the single-active-session rule; that is the job of
    /// [`SessionLifecycle`](crate::tracker::SessionLifecycle).
    pub fn save_new_session(&self, session: &mut WorkSession) -> Result<i64> {
        if let Some(id) = session.id {
            return Err(Error::Validation(format!("Work session {} is already saved", id)));
        }

        let id = self.write(|conn| {
            conn.execute(
                "INSERT INTO work_sessions (project_id, start_time, end_time, description)
                 VALUES (?, ?, ?, ?)",
                (
                    session.project_id,
                    format_timestamp(&session.start_time),
                    session.end_time.as_ref().map(format_timestamp),
                    &session.description,
                ),
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        session.id = Some(id);
        tracing::debug!("Saved work session {} for project {}", id, session.project_id);
        Ok(id)
    }

    /// Write end time and description. Start time and project are immutable.
    pub fn update_session(&self, session: &WorkSession) -> Result<()> {
        let id = session
            .id
            .ok_or_else(|| Error::Validation("Work session has not been saved yet".into()))?;

        let rows = self.write(|conn| {
            conn.execute(
                "UPDATE work_sessions SET end_time = ?, description = ? WHERE id = ?",
                (
                    session.end_time.as_ref().map(format_timestamp),
                    &session.description,
                    id,
                ),
            )
        })?;

        tracing::debug!("Updated work session {} ({} row(s))", id, rows);
        Ok(())
    }

    /// All sessions of a project, in no particular order.
    pub fn list_sessions_for_project(&self, project_id: i64) -> Result<Vec<WorkSession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM work_sessions WHERE project_id = ?",
            SESSION_COLUMNS
        ))?;

        let sessions = stmt
            .query_map([project_id], session_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sessions)
    }

    /// Replace the project's in-memory sessions with what is stored.
    pub fn load_sessions(&self, project: &mut Project) -> Result<()> {
        let id = project
            .id
            .ok_or_else(|| Error::Validation("Project has not been saved yet".into()))?;
        project.sessions = self.list_sessions_for_project(id)?;
        Ok(())
    }

    /// The running session, if any.
    ///
    /// More than one running session, or a running session whose project row
    /// is gone, means the store is corrupt. Both are reported as
    /// [`Error::DataIntegrity`] instead of picking one or skipping rows.
    pub fn get_active_session(&self) -> Result<Option<ActiveSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.project_id, s.start_time, s.end_time, s.description, p.name
             FROM work_sessions s LEFT JOIN projects p ON p.id = s.project_id
             WHERE s.end_time IS NULL ORDER BY s.id",
        )?;

        let mut running = stmt
            .query_map([], |row| {
                Ok((session_from_row(row)?, row.get::<_, Option<String>>(5)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if running.len() > 1 {
            let ids: Vec<String> = running
                .iter()
                .filter_map(|(session, _)| session.id)
                .map(|id| id.to_string())
                .collect();
            tracing::error!("Found {} running work sessions: {}", running.len(), ids.join(", "));
            return Err(Error::DataIntegrity(format!(
                "{} work sessions are running at once (ids {})",
                running.len(),
                ids.join(", ")
            )));
        }

        match running.pop() {
            None => Ok(None),
            Some((session, Some(project_name))) => Ok(Some(ActiveSession {
                session,
                project_name,
            })),
            Some((session, None)) => {
                tracing::error!(
                    "Running work session {:?} points at missing project {}",
                    session.id,
                    session.project_id
                );
                Err(Error::DataIntegrity(format!(
                    "Work session {} is running for project {}, which does not exist",
                    session.id.unwrap_or_default(),
                    session.project_id
                )))
            }
        }
    }
}

/// The platform data directory, e.g. `~/.local/share/timetrack`.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME).ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })?;
    Ok(dirs.data_dir().to_path_buf())
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        archived: row.get::<_, Option<i64>>(3)?.unwrap_or(0) != 0,
        sessions: Vec::new(),
    })
}

/// Expects the columns in [`SESSION_COLUMNS`] order.
fn session_from_row(row: &Row<'_>) -> rusqlite::Result<WorkSession> {
    Ok(WorkSession {
        id: Some(row.get(0)?),
        project_id: row.get(1)?,
        start_time: parse_timestamp(2, row.get(2)?)?,
        end_time: row
            .get::<_, Option<String>>(3)?
            .map(|s| parse_timestamp(3, s))
            .transpose()?,
        description: row.get(4)?,
    })
}

fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts whole seconds as well as fractional seconds.
fn parse_timestamp(column: usize, s: String) -> rusqlite::Result<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

use chrono::{Local, NaiveDateTime, SubsecRound, TimeDelta};
use serde::{Deserialize, Serialize};

use super::duration::SessionDuration;

/// A span of work on a project.
///
/// A session is active while `end_time` is `None`. Across the whole store at
/// most one session may be active at a time; that rule is enforced by
/// [`SessionLifecycle`](crate::tracker::SessionLifecycle), not here.
///
/// # Lifecycle
/// Created active → ended exactly once → immutable. There is no reopen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSession {
    /// Row id, assigned when the session is first saved.
    pub id: Option<i64>,
    pub project_id: i64,
    /// Local wall-clock time, whole seconds.
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub description: Option<String>,
}

impl WorkSession {
    /// A new active session starting now.
    pub fn start(project_id: i64, description: Option<&str>) -> Self {
        Self::started_at(project_id, now(), description)
    }

    pub fn started_at(project_id: i64, start_time: NaiveDateTime, description: Option<&str>) -> Self {
        Self {
            id: None,
            project_id,
            start_time: start_time.trunc_subsecs(0),
            end_time: None,
            description: normalize_description(description),
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// End the session now. Ending an ended session does nothing.
    pub fn end(&mut self) {
        self.end_at(now());
    }

    /// End the session at `at`, never earlier than its start.
    pub fn end_at(&mut self, at: NaiveDateTime) {
        if self.end_time.is_some() {
            return;
        }
        self.end_time = Some(at.trunc_subsecs(0).max(self.start_time));
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = normalize_description(description);
    }

    /// Time worked so far, measured against the current time when active.
    pub fn duration(&self) -> TimeDelta {
        self.duration_at(now())
    }

    pub fn duration_at(&self, now: NaiveDateTime) -> TimeDelta {
        let end = self.end_time.unwrap_or(now);
        (end - self.start_time).max(TimeDelta::zero())
    }

    pub fn elapsed(&self) -> SessionDuration {
        self.elapsed_at(now())
    }

    pub fn elapsed_at(&self, now: NaiveDateTime) -> SessionDuration {
        SessionDuration {
            elapsed: self.duration_at(now),
            active: self.is_active(),
        }
    }
}

/// The current local wall-clock time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

//! Sample data for trying the tool out by hand.

use chrono::{NaiveDateTime, TimeDelta};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{now, Project, WorkSession};
use crate::tracker::Tracker;

/// Counts of what [`seed_sample_data`] created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub projects: usize,
    pub sessions: usize,
}

/// Fill an empty store with three projects (one archived) and four
/// sessions, one of them running.
///
/// All rows are written in one transaction: a failure leaves the store
/// empty, so seeding can simply be retried.
pub fn seed_sample_data(tracker: &Tracker) -> Result<SeedSummary> {
    if !tracker.list_all_projects()?.is_empty() {
        return Err(Error::Conflict(
            "Sample data can only be added to an empty store".into(),
        ));
    }

    let summary = tracker.database().atomically(|db| {
        let sessions = write_sample_data(tracker, db)?;
        Ok(SeedSummary {
            projects: 3,
            sessions,
        })
    })?;
    tracing::info!(
        "Seeded {} projects and {} work sessions",
        summary.projects,
        summary.sessions
    );
    Ok(summary)
}

fn write_sample_data(tracker: &Tracker, db: &Database) -> Result<usize> {
    let now = now();
    let ago = |days: i64, hours: i64, minutes: i64| {
        now - TimeDelta::days(days) - TimeDelta::hours(hours) - TimeDelta::minutes(minutes)
    };

    let alpha = tracker.create_project("Project Alpha", "AI project.")?;
    let beta = tracker.create_project("Project Beta", "Web development project.")?;
    let mut gamma = tracker.create_project("Project Gamma", "An archived project.")?;
    tracker.projects().archive(&mut gamma)?;

    let alpha_id = saved(&alpha)?;
    let beta_id = saved(&beta)?;

    let mut sessions = vec![
        ended(alpha_id, ago(2, 3, 0), ago(2, 1, 0), "Research on machine learning models."),
        ended(alpha_id, ago(1, 5, 0), ago(1, 2, 0), "Implemented a neural network."),
        ended(beta_id, ago(0, 4, 0), ago(0, 1, 0), "Developed the front-end components."),
        WorkSession::started_at(beta_id, ago(0, 0, 30), Some("Testing the API endpoints.")),
    ];
    for session in &mut sessions {
        db.save_new_session(session)?;
    }
    Ok(sessions.len())
}

fn ended(project_id: i64, from: NaiveDateTime, to: NaiveDateTime, description: &str) -> WorkSession {
    let mut session = WorkSession::started_at(project_id, from, Some(description));
    session.end_at(to);
    session
}

fn saved(project: &Project) -> Result<i64> {
    project
        .id
        .ok_or_else(|| Error::Validation("Project has not been saved yet".into()))
}

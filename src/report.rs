//! CSV export of a project's work sessions.
//!
//! One row per session:
//! ```text
//! project_id,project_name,start_time,end_time,duration,description
//! 1,Alpha,2025-03-14 09:00:00,2025-03-14 10:01:01,1u 1m 1s,work
//! 1,Alpha,2025-03-14 11:00:00,,running,
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::models::{Project, WorkSession};

const HEADER: [&str; 6] = [
    "project_id",
    "project_name",
    "start_time",
    "end_time",
    "duration",
    "description",
];
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RUNNING: &str = "running";

/// Write the project's loaded sessions as CSV, oldest first.
pub fn write_csv<W: Write>(project: &Project, mut out: W) -> Result<()> {
    let project_id = saved_id(project)?;

    write_record(&mut out, &HEADER)?;

    let mut sessions: Vec<&WorkSession> = project.sessions.iter().collect();
    sessions.sort_by_key(|s| s.start_time);

    for session in sessions {
        let elapsed = session.elapsed();
        let duration = if elapsed.active {
            RUNNING.to_string()
        } else {
            elapsed.label()
        };
        write_record(
            &mut out,
            &[
                &project_id.to_string(),
                &project.name,
                &format_time(&session.start_time),
                &session.end_time.as_ref().map(format_time).unwrap_or_default(),
                &duration,
                session.description.as_deref().unwrap_or_default(),
            ],
        )?;
    }

    out.flush()?;
    Ok(())
}

/// Write the report to `<dir>/project_<id>_<name>.csv`, creating `dir`.
pub fn export_project(project: &Project, dir: &Path) -> Result<PathBuf> {
    let project_id = saved_id(project)?;
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("project_{}_{}.csv", project_id, slug(&project.name)));
    let file = fs::File::create(&path)?;
    write_csv(project, std::io::BufWriter::new(file))?;

    tracing::info!(
        "Exported {} session(s) of project {} to {}",
        project.sessions.len(),
        project_id,
        path.display()
    );
    Ok(path)
}

fn saved_id(project: &Project) -> Result<i64> {
    project
        .id
        .ok_or_else(|| Error::Validation("Only saved projects can be exported".into()))
}

fn write_record<W: Write>(out: &mut W, fields: &[&str]) -> std::io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    writeln!(out, "{}", line.join(","))
}

/// Quote a field when it holds a separator, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_time(t: &NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// File-name safe rendering of a project name.
fn slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "project".to_string()
    } else {
        slug.to_string()
    }
}

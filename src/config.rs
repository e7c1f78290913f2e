//! Runtime configuration.
//!
//! Resolved from environment variables, falling back to the platform data
//! directory:
//! - `TIMETRACK_DB_PATH` - SQLite database file (default: `<data dir>/timetrack.db`)
//! - `TIMETRACK_EXPORT_PATH` - directory for CSV reports (default: `<data dir>/export`)

use std::path::PathBuf;

use anyhow::Result;

use crate::db::{self, Database};

const EXPORT_DIR: &str = "export";

pub const DB_PATH_VAR: &str = "TIMETRACK_DB_PATH";
pub const EXPORT_PATH_VAR: &str = "TIMETRACK_EXPORT_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
}

impl Config {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match non_empty(lookup(DB_PATH_VAR)) {
            Some(path) => PathBuf::from(path),
            None => Database::default_path()?,
        };
        let export_dir = match non_empty(lookup(EXPORT_PATH_VAR)) {
            Some(path) => PathBuf::from(path),
            None => db::data_dir()?.join(EXPORT_DIR),
        };
        Ok(Self {
            db_path,
            export_dir,
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, db_path: Option<PathBuf>, export_dir: Option<PathBuf>) -> Self {
        if let Some(path) = db_path {
            self.db_path = path;
        }
        if let Some(dir) = export_dir {
            self.export_dir = dir;
        }
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

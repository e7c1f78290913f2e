//! Local project time tracking.
//!
//! Projects own work sessions; across the whole store at most one work
//! session runs at a time. [`tracker::Tracker`] is the entry point for front
//! ends, [`db::Database`] the only code that touches SQLite.

pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod models;
pub mod report;
pub mod seed;
pub mod tracker;

pub use error::{Error, Result};

//! Domain models for timetrack.
//!
//! - [`Project`]: something work is booked against. Archived, never deleted.
//! - [`WorkSession`]: a span of work on one project. Active while it has no
//!   end time; at most one session in the whole store is active at once.
//! - [`ActiveSession`]: the running session joined with its project's name.
//!
//! Models carry no persistence knowledge; see [`crate::db`].

mod duration;
mod project;
mod session;

pub use duration::*;
pub use project::*;
pub use session::*;

use serde::{Deserialize, Serialize};

/// The one running work session, with the name of the project it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    #[serde(flatten)]
    pub session: WorkSession,
    pub project_name: String,
}

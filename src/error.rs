use thiserror::Error;

/// Failures surfaced by the tracker core.
///
/// `Persistence` means the storage layer broke; `DataIntegrity` means the
/// stored data violates an invariant this crate is responsible for. The two
/// are kept apart so an operator can tell which one happened.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No work session is running")]
    NoActiveSession,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Storage failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data integrity violated: {0}")]
    DataIntegrity(String),
}

impl Error {
    pub fn project_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Project",
            id,
        }
    }

    /// Whether the failure only aborts the current operation and the caller
    /// can simply re-prompt.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Conflict(_) | Self::NoActiveSession | Self::NotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

/// Errors surfaced by a [`crate::JobStore`] implementation.
///
/// Validation errors abort the
/// calling operation with no side effect, not-found/state errors are
/// surfaced to the operator, and `Database` wraps whatever the concrete
/// backend's driver produced.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job with id '{0}' already exists")]
    DuplicateId(String),

    #[error("job with id '{0}' not found")]
    NotFound(String),

    #[error("job '{id}' is in state '{actual}', expected '{expected}'")]
    InvalidState {
        id: String,
        actual: String,
        expected: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

use queuectl_core::StoreError;
use thiserror::Error;

/// Errors surfaced by command handlers, on top of the Store's own
/// [`StoreError`] taxonomy.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type CliResult<T> = Result<T, CliError>;

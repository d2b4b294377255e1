use core_config::ConfigError;
use thiserror::Error;

/// Errors raised by the stats worker
///
/// `Configuration` and `Connectivity` happen at startup and stop the process.
/// `Query` is scoped to a single tick and never ends the polling loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Error {operation}: {cause}")]
    Query {
        operation: &'static str,
        cause: String,
    },
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl WorkerError {
    /// Whether this error must stop the process
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WorkerError::Query { .. })
    }
}

impl From<ConfigError> for WorkerError {
    fn from(err: ConfigError) -> Self {
        WorkerError::Configuration(err.to_string())
    }
}

use thiserror::Error;

/// Everything that can go wrong while serving a todo request.
#[derive(Debug, Error)]
pub enum TodoError {
    /// A required form field was missing or blank.
    #[error("missing required field '{0}'")]
    Validation(&'static str),

    /// No todo is stored under this id.
    #[error("todo {0} does not exist")]
    NotFound(i64),

    #[error("{action}: {source}")]
    Storage {
        action: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to render page: {0}")]
    Template(#[from] tera::Error),
}

pub type Result<T> = std::result::Result<T, TodoError>;

/// Attach a description of the failed database action to a rusqlite error.
pub trait StorageContext<T> {
    fn storage(self, action: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, action: &'static str) -> Result<T> {
        self.map_err(|source| TodoError::Storage { action, source })
    }
}

/// Swallow a failure at the handler boundary, leaving a trace in the log.
pub trait LogFailure<T> {
    fn log_failure(self, while_doing: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogFailure<T> for std::result::Result<T, E> {
    fn log_failure(self, while_doing: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Error occurred while {}: {}", while_doing, e);
                None
            }
        }
    }
}

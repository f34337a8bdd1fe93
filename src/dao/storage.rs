use std::{error::Error, path::Path};

use thiserror::Error;

/// Result alias for profile storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure raised by a profile backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or written to.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored profile exists but cannot be decoded.
    #[error("corrupt profile `{path}`")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Wrap a filesystem failure, naming the action and the file involved.
    pub fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::unavailable(format!("failed to {action} `{}`", path.display()), source)
    }

    pub fn corrupt(path: &Path, source: serde_json::Error) -> Self {
        StorageError::Corrupt {
            path: path.display().to_string(),
            source,
        }
    }
}

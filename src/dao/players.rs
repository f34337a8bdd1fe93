//! Reader for the static player dataset (a JSON array of [`PlayerEntity`] rows).

use std::{fs, io, path::Path};

use thiserror::Error;

use crate::dao::models::PlayerEntity;

/// Failures while reading the player dataset.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// The file is missing or unreadable.
    #[error("failed to read player data `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The file does not contain a valid array of player rows.
    #[error("malformed player data `{path}`")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read every player row from `path`.
pub fn read_player_file(path: &Path) -> Result<Vec<PlayerEntity>, DataLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| DataLoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}

use std::path::PathBuf;

use piral_core::ActionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("store root {path} is not usable: {error}")]
    RootPathInvalid {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed stored item: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Action(#[from] ActionError),
}

pub type Result<T> = std::result::Result<T, PersistError>;

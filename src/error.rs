use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TendError {
    #[error("failed to read store file {}: {source}", path.display())]
    StoreRead { path: PathBuf, source: io::Error },

    #[error("failed to write store file {}: {source}", path.display())]
    StoreWrite { path: PathBuf, source: io::Error },

    #[error("store file {} is not valid JSON: {source}", path.display())]
    StoreParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid care interval '{input}': {reason}")]
    InvalidFrequency { input: String, reason: String },

    #[error("name must not be empty")]
    EmptyName,

    #[error("--animal only applies to pets")]
    AnimalForPlant,

    #[error("no entry matches id '{id}'")]
    NotFound { id: String },

    #[error("id '{id}' matches more than one entry")]
    AmbiguousId { id: String },

    #[error("notification error: {0}")]
    Notification(String),
}

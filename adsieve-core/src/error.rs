use crate::types::Collection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rejected input: {message}")]
    InvalidInput { message: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Stored {collection} payload could not be parsed: {reason}")]
    Parse {
        collection: Collection,
        reason: String,
    },

    #[error("Failed to read key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Failed to write key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Entry not fully rendered: {reason}")]
    NotRendered { reason: String },

    #[error("Entry is not an ad: {reason}")]
    NotAnAd { reason: String },

    #[error("No ad id found in entry link")]
    MissingId,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file {path} does not exist")]
    FileNotFound { path: String },

    #[error("Config file unreadable: {details}")]
    InvalidFormat { details: String },

    #[error("Config rejected: {reason}")]
    ValidationFailed { reason: String },

    #[error("Config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

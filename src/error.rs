use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PhytoError {
    #[error("invalid plant name: {0:?}")]
    InvalidPlantName(String),

    #[error("invalid structure provider: {0} (expected pubchem or imppat)")]
    InvalidProvider(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("request failed: {0}")]
    RetrievalHttp(String),

    #[error("{source_name} returned status {status}: {message}")]
    Retrieval {
        source_name: String,
        status: u16,
        message: String,
    },

    #[error("{0}")]
    #[diagnostic(help("check the plant name spelling against IMPPAT"))]
    NotFound(String),

    #[error("failed to write {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("no PubChem compound matches {0:?}")]
    IdentifierNotFound(String),

    #[error("missing identifier for {0:?}")]
    MissingIdentifier(String),

    #[error("{path} is already taken by {other:?} in this batch")]
    #[diagnostic(help("compound names that differ only in special characters share a file name"))]
    FileNameCollision { path: String, other: String },
}

impl PhytoError {
    pub(crate) fn persistence(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        PhytoError::Persistence {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

//! Assembly error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while producing or reading a cloud assembly
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error(transparent)]
    Synth(#[from] bluegreen_core::SynthError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Unsupported manifest version: {0}")]
    UnsupportedVersion(u32),

    #[error("Unknown template format: {0} (expected json or yaml)")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, AssemblyError>;

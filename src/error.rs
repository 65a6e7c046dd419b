//! Error types for packmule
//!
//! Uses `thiserror` for library errors. Build failures are never retried or
//! masked: a build either completes and is announced, or fails visibly.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::Kind;
use crate::storage::StorageError;

/// Result type alias for packmule operations
pub type PackResult<T> = Result<T, PackError>;

/// Main error type for packmule operations
#[derive(Error, Debug)]
pub enum PackError {
    /// Package definition is structurally invalid; nothing is registered
    /// under that name
    #[error("invalid package '{name}': {message}")]
    Configuration { name: String, message: String },

    /// Caller requested an unregistered name/kind pair
    #[error("no {kind} package named '{name}'")]
    PackageNotFound { kind: Kind, name: String },

    /// A declared source path is missing or unreadable
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: StorageError,
    },

    /// Storage rejected a write or delete of an artifact
    #[error("failed to write '{path}'")]
    Write {
        path: String,
        #[source]
        source: StorageError,
    },

    /// External compile stage failed
    #[error("compilation failed for '{path}': {message}")]
    Compile { path: String, message: String },

    /// External compress stage failed
    #[error("compression failed for package '{package}': {message}")]
    Compress { package: String, message: String },

    /// Automatic builds are disabled and no artifact exists to serve
    #[error("no artifact on disk for {kind} package '{name}' and automatic builds are disabled")]
    NoArtifact { kind: Kind, name: String },

    /// Configuration file could not be parsed
    #[error("invalid configuration in {file}: {message}")]
    ConfigFile { file: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

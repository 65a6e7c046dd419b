//! Storage port - abstraction over artifact and source byte storage
//!
//! All paths handled here are root-relative identifiers with forward
//! slashes, matching the identifiers produced by package resolution.

use std::path::PathBuf;

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage operation errors
#[derive(Debug)]
pub enum StorageError {
    /// Entry not found
    NotFound(PathBuf),
    /// Permission denied
    PermissionDenied(PathBuf),
    /// I/O error
    Io(std::io::Error),
    /// Other error
    Other(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(PathBuf::new()),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(PathBuf::new()),
            _ => StorageError::Io(err),
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound(path) => write!(f, "entry not found: {}", path.display()),
            StorageError::PermissionDenied(path) => {
                write!(f, "permission denied: {}", path.display())
            }
            StorageError::Io(err) => write!(f, "I/O error: {}", err),
            StorageError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Abstract byte storage interface
///
/// Implementations:
/// - `LocalStorage` - a rooted directory with atomic writes
/// - `MemoryStorage` - in-memory map for tests and embedding
pub trait Storage: Send + Sync {
    /// Read the full content at `path`
    fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Write content at `path` atomically, creating parent directories
    fn write(&self, path: &str, content: &[u8]) -> StorageResult<()>;

    /// Check whether an entry exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// List the file names directly inside `dir`, ordered oldest to newest
    /// by modification time
    ///
    /// The ordering is what lets version recovery pick the most recent
    /// artifact when several candidates match an output template.
    fn listing(&self, dir: &str) -> StorageResult<Vec<String>>;

    /// Delete the entry at `path`
    fn delete(&self, path: &str) -> StorageResult<()>;

    /// Public URL for the entry at `path`
    fn url(&self, path: &str) -> String;
}

/// Join a public URL prefix and a root-relative path
pub(crate) fn join_url(prefix: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", prefix.trim_end_matches('/'), path)
}

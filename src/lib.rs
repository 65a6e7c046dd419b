//! Packmule - asset packager with content-derived versioning
//!
//! Packmule assembles named groups of source files into single output
//! artifacts and embeds a content-derived version token in each artifact's
//! filename, so consumers can cache the artifact indefinitely until its
//! content changes. At most one current artifact exists per package on
//! disk; prior versions are cleaned up after each successful rebuild.

pub mod compress;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod packager;
pub mod registry;
pub mod storage;
pub mod versioning;

// Re-exports for convenience
pub use compress::{Compiler, Compressor, ConcatCompressor, NoopCompiler};
pub use config::{Config, ConfigWarning, KindConfig, PackageConfig};
pub use error::{PackError, PackResult};
pub use events::{BuildEvent, EventSink, NoopEventSink};
pub use models::{Kind, Package, Version};
pub use packager::{BuildProduct, Packager};
pub use registry::PackageRegistry;
pub use storage::{LocalStorage, MemoryStorage, Storage, StorageError};
pub use versioning::{HashAlgorithm, VersioningEngine};

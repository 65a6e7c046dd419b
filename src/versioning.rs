//! Content versioning engine
//!
//! Computes deterministic version tokens from package source content,
//! renders output filenames, recovers the previous version from the newest
//! artifact already on disk, and removes artifacts left over from prior
//! versions. The digest algorithm is an injected strategy value.
//!
//! No manifest is kept: the prior version is recovered by locating the
//! placeholder's span inside the rendered filename. The artifact directory
//! stays the single source of truth.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use crate::error::{PackError, PackResult};
use crate::models::Version;
use crate::storage::{Storage, StorageError};

/// Digest strategy for version tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256, 64 hex chars (default)
    #[default]
    Sha256,
    /// BLAKE3, 64 hex chars
    Blake3,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    fn hasher(&self) -> Hasher {
        match self {
            HashAlgorithm::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

/// Incremental digest state for one version computation
enum Hasher {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(bytes),
            Hasher::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
            Hasher::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Separator fed to the digest between successive source files
///
/// Without it `["ab", "c"]` and `["a", "bc"]` would collide.
const SEPARATOR: &[u8] = b"\n";

/// Versioning engine for one asset kind
pub struct VersioningEngine {
    storage: Arc<dyn Storage>,
    algorithm: HashAlgorithm,
    placeholder: String,
}

impl VersioningEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        algorithm: HashAlgorithm,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            algorithm,
            placeholder: placeholder.into(),
        }
    }

    /// Placeholder token substituted inside output templates
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Compute the version token for `paths`, in order
    ///
    /// Reads every path through storage; any unreadable path fails the whole
    /// computation and the caller must not write a partial artifact.
    pub fn version(&self, paths: &[String]) -> PackResult<Version> {
        let mut hasher = self.algorithm.hasher();
        for (index, path) in paths.iter().enumerate() {
            if index > 0 {
                hasher.update(SEPARATOR);
            }
            let content = self.storage.read(path).map_err(|source| PackError::Read {
                path: path.clone(),
                source,
            })?;
            hasher.update(&content);
        }
        Ok(Version::new(hasher.finalize_hex()))
    }

    /// Substitute the placeholder inside `template` with `version`
    ///
    /// A template without a placeholder is returned unchanged - the artifact
    /// name then never varies across rebuilds (manual-update mode).
    pub fn output_filename(&self, template: &str, version: &Version) -> String {
        template.replacen(&self.placeholder, version.as_str(), 1)
    }

    /// Decide whether the artifact for `template` is stale relative to the
    /// current content of `paths`
    ///
    /// Returns the freshly computed version either way. Without a
    /// placeholder the answer is always "not stale": content changes alone
    /// never trigger a rebuild, only force does.
    pub fn needs_update(&self, template: &str, paths: &[String]) -> PackResult<(bool, Version)> {
        let current = self.version(paths)?;
        if !template.contains(&self.placeholder) {
            return Ok((false, current));
        }
        let previous = self.version_from_file(template)?;
        let stale = previous.as_ref() != Some(&current);
        Ok((stale, current))
    }

    /// Recover the version embedded in the newest on-disk artifact matching
    /// `template`
    ///
    /// Returns `None` when no placeholder is configured, when the output
    /// directory does not exist yet, or when nothing matches - first-ever
    /// builds proceed instead of failing.
    pub fn version_from_file(&self, template: &str) -> PackResult<Option<Version>> {
        let (dir, pattern) = split_template(template);
        let Some((prefix, suffix)) = placeholder_span(pattern, &self.placeholder) else {
            return Ok(None);
        };

        let names = match self.storage.listing(dir) {
            Ok(names) => names,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(source) => {
                return Err(PackError::Read {
                    path: dir.to_string(),
                    source,
                })
            }
        };

        // listing is oldest to newest; take the most recent match
        for name in names.iter().rev() {
            if let Some(token) = extract_token(name, prefix, suffix) {
                return Ok(Some(Version::new(token)));
            }
        }
        Ok(None)
    }

    /// Delete every artifact matching `template` whose embedded version is
    /// not `keep`
    ///
    /// Run after the new artifact is written, so there is never a moment
    /// with zero current artifacts on disk. Any directory entry matching the
    /// template's literal prefix and suffix is treated as a prior version;
    /// keep unrelated files out of the output directory.
    pub fn cleanup(&self, template: &str, keep: &Version) -> PackResult<()> {
        let (dir, pattern) = split_template(template);
        let Some((prefix, suffix)) = placeholder_span(pattern, &self.placeholder) else {
            return Ok(());
        };

        let names = match self.storage.listing(dir) {
            Ok(names) => names,
            Err(StorageError::NotFound(_)) => return Ok(()),
            Err(source) => {
                return Err(PackError::Read {
                    path: dir.to_string(),
                    source,
                })
            }
        };

        for name in &names {
            let Some(token) = extract_token(name, prefix, suffix) else {
                continue;
            };
            if token == keep.as_str() {
                continue;
            }
            let path = if dir.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", dir, name)
            };
            tracing::info!(artifact = %path, "removing stale artifact");
            self.storage
                .delete(&path)
                .map_err(|source| PackError::Write { path, source })?;
        }
        Ok(())
    }
}

/// Split a root-relative template into directory and filename pattern
fn split_template(template: &str) -> (&str, &str) {
    match template.rfind('/') {
        Some(index) => (&template[..index], &template[index + 1..]),
        None => ("", template),
    }
}

/// Literal prefix and suffix around the placeholder, if present
fn placeholder_span<'a>(pattern: &'a str, placeholder: &str) -> Option<(&'a str, &'a str)> {
    let index = pattern.find(placeholder)?;
    Some((&pattern[..index], &pattern[index + placeholder.len()..]))
}

/// Substring of `name` occupying the placeholder's span, if `name` matches
/// the template's literal prefix and suffix
fn extract_token<'a>(name: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    let token = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

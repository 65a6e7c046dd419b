//! Local disk storage
//!
//! Implements the `Storage` port against a rooted directory. Writes go
//! through a temporary file and rename so a concurrent reader never
//! observes a half-written artifact.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{join_url, Storage, StorageError, StorageResult};

/// Directory-rooted storage with atomic writes and a public URL prefix
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalStorage {
    /// Create storage rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            url_prefix: String::new(),
        }
    }

    /// Set the public URL prefix used by `url`
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    /// Root directory this storage resolves against
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for LocalStorage {
    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(full.clone()),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(full.clone()),
            _ => StorageError::Io(e),
        })
    }

    fn write(&self, path: &str, content: &[u8]) -> StorageResult<()> {
        let full = self.resolve(path);
        let parent = full.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&full)
            .map_err(|e| StorageError::Other(format!("persist {}: {}", full.display(), e.error)))?;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn listing(&self, dir: &str) -> StorageResult<Vec<String>> {
        let full = self.resolve(dir);
        let entries = fs::read_dir(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(full.clone()),
            _ => StorageError::Io(e),
        })?;

        let mut names: Vec<(SystemTime, String)> = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let modified = entry
                .metadata()?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            names.push((modified, entry.file_name().to_string_lossy().into_owned()));
        }

        // tie-break on name so equal mtimes still list deterministically
        names.sort();
        Ok(names.into_iter().map(|(_, name)| name).collect())
    }

    fn delete(&self, path: &str) -> StorageResult<()> {
        let full = self.resolve(path);
        fs::remove_file(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(full.clone()),
            _ => StorageError::Io(e),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.url_prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_storage_write_and_read() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write("css/pack.css", b"body {}").unwrap();
        let content = storage.read("css/pack.css").unwrap();

        assert_eq!(content, b"body {}");
    }

    #[test]
    fn local_storage_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write("deeply/nested/pack.js", b"1;").unwrap();

        assert!(dir.path().join("deeply/nested/pack.js").exists());
    }

    #[test]
    fn local_storage_write_overwrites() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write("pack.css", b"old").unwrap();
        storage.write("pack.css", b"new").unwrap();

        assert_eq!(storage.read("pack.css").unwrap(), b"new");
    }

    #[test]
    fn local_storage_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.read("missing.css").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn local_storage_exists() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(!storage.exists("pack.css"));
        storage.write("pack.css", b"x").unwrap();
        assert!(storage.exists("pack.css"));
    }

    #[test]
    fn local_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write("pack.css", b"x").unwrap();
        storage.delete("pack.css").unwrap();

        assert!(!storage.exists("pack.css"));
    }

    #[test]
    fn local_storage_listing_skips_directories() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write("build/a.css", b"a").unwrap();
        storage.write("build/b.css", b"b").unwrap();
        storage.write("build/sub/c.css", b"c").unwrap();

        let names = storage.listing("build").unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.css".to_string()));
        assert!(names.contains(&"b.css".to_string()));
    }

    #[test]
    fn local_storage_listing_missing_dir_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.listing("nowhere").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn local_storage_url_uses_prefix() {
        let storage = LocalStorage::new("/srv/assets").with_url_prefix("/static");
        assert_eq!(storage.url("css/pack.css"), "/static/css/pack.css");
    }
}

//! In-memory storage
//!
//! Backs the `Storage` port with a shared map. Useful for tests and for
//! embedding the engine without touching disk. Write order stands in for
//! modification time in `listing`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{join_url, Storage, StorageError, StorageResult};

/// Shared in-memory storage
///
/// Uses `Arc<Mutex<_>>` internally so clones observe the same contents.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, (u64, Vec<u8>)>>>,
    tick: Arc<AtomicU64>,
    url_prefix: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the public URL prefix used by `url`
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    fn normalize(path: &str) -> String {
        path.trim_start_matches('/').to_string()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&Self::normalize(path))
            .map(|(_, content)| content.clone())
            .ok_or_else(|| StorageError::NotFound(PathBuf::from(path)))
    }

    fn write(&self, path: &str, content: &[u8]) -> StorageResult<()> {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(Self::normalize(path), (tick, content.to_vec()));
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(&Self::normalize(path))
    }

    fn listing(&self, dir: &str) -> StorageResult<Vec<String>> {
        let dir = Self::normalize(dir);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<(u64, String)> = entries
            .iter()
            .filter_map(|(path, (tick, _))| {
                let rest = path.strip_prefix(&prefix)?;
                // direct children only
                if rest.is_empty() || rest.contains('/') {
                    return None;
                }
                Some((*tick, rest.to_string()))
            })
            .collect();

        if names.is_empty() && !entries.keys().any(|path| path.starts_with(&prefix)) {
            return Err(StorageError::NotFound(PathBuf::from(dir)));
        }

        names.sort();
        Ok(names.into_iter().map(|(_, name)| name).collect())
    }

    fn delete(&self, path: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .remove(&Self::normalize(path))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(PathBuf::from(path)))
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.url_prefix, path)
    }
}

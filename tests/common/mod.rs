//! Test environment builder for isolated packmule testing.
//!
//! Provides `TestEnv` - a temp asset root plus helpers to seed source
//! files, describe packages, and construct packagers against the root.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use packmule::{
    Compressor, ConcatCompressor, Config, LocalStorage, NoopCompiler, PackResult, Package,
    PackageConfig, Packager, Storage,
};

/// Isolated asset root with a config under construction
pub struct TestEnv {
    root: TempDir,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config = Config {
            root: root.path().to_path_buf(),
            ..Config::default()
        };
        Self { root, config }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Seed a source file under the asset root
    pub fn write_source(&self, rel: &str, content: &str) {
        let path = self.root.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn remove_source(&self, rel: &str) {
        fs::remove_file(self.root.path().join(rel)).unwrap();
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root.path().join(rel).exists()
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.root.path().join(rel)).unwrap()
    }

    /// Files directly inside `rel`, sorted by name
    pub fn listing(&self, rel: &str) -> Vec<String> {
        let dir = self.root.path().join(rel);
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Register a css package
    pub fn with_css_package(mut self, name: &str, patterns: &[&str], output: &str) -> Self {
        self.config.css.packages.insert(
            name.to_string(),
            PackageConfig {
                source_filenames: patterns.iter().map(|s| s.to_string()).collect(),
                output_filename: Some(output.to_string()),
                ..PackageConfig::default()
            },
        );
        self
    }

    /// Register a js package
    pub fn with_js_package(mut self, name: &str, patterns: &[&str], output: &str) -> Self {
        self.config.js.packages.insert(
            name.to_string(),
            PackageConfig {
                source_filenames: patterns.iter().map(|s| s.to_string()).collect(),
                output_filename: Some(output.to_string()),
                ..PackageConfig::default()
            },
        );
        self
    }

    /// Register an external js package
    pub fn with_external_js_package(mut self, name: &str, urls: &[&str]) -> Self {
        self.config.js.packages.insert(
            name.to_string(),
            PackageConfig {
                external_urls: urls.iter().map(|s| s.to_string()).collect(),
                ..PackageConfig::default()
            },
        );
        self
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::new(LocalStorage::new(self.root.path()))
    }

    /// Packager with the built-in concatenating compressor
    pub fn packager(&self) -> Packager<NoopCompiler, ConcatCompressor> {
        let storage = self.storage();
        let compressor = ConcatCompressor::new(storage.clone());
        Packager::new(self.config.clone(), storage, NoopCompiler, compressor).unwrap()
    }

    /// Packager whose compressor counts invocations
    pub fn counting_packager(
        &self,
    ) -> (Packager<NoopCompiler, CountingCompressor>, Arc<AtomicUsize>) {
        let storage = self.storage();
        let count = Arc::new(AtomicUsize::new(0));
        let compressor = CountingCompressor {
            inner: ConcatCompressor::new(storage.clone()),
            count: count.clone(),
        };
        let packager =
            Packager::new(self.config.clone(), storage, NoopCompiler, compressor).unwrap();
        (packager, count)
    }
}

/// Compressor wrapper that counts compress invocations
pub struct CountingCompressor {
    inner: ConcatCompressor,
    count: Arc<AtomicUsize>,
}

impl Compressor for CountingCompressor {
    fn compress_stylesheets(&self, sources: &[String], package: &Package) -> PackResult<Vec<u8>> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.compress_stylesheets(sources, package)
    }

    fn compress_scripts(&self, sources: &[String], package: &Package) -> PackResult<Vec<u8>> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.compress_scripts(sources, package)
    }

    fn compile_templates(&self, package: &Package) -> PackResult<Vec<u8>> {
        self.inner.compile_templates(package)
    }
}

/// Path to the compiled packmule binary
pub fn packmule_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_packmule"))
}

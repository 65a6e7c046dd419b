//! Package builder
//!
//! Orchestrates the build of one package: decide whether a rebuild is due,
//! and if so run compile -> compress -> write -> cleanup -> notify, in that
//! order. Otherwise resolve the name of the artifact already on disk. The
//! rendered output filename is the single externally observable result -
//! callers only ever need "what is today's artifact name for package X".

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::compress::{Compiler, Compressor};
use crate::config::Config;
use crate::error::{PackError, PackResult};
use crate::events::{BuildEvent, EventSink};
use crate::models::{Kind, Package};
use crate::registry::PackageRegistry;
use crate::storage::Storage;
use crate::versioning::VersioningEngine;

/// Result of building one package
#[derive(Debug, Clone, PartialEq)]
pub enum BuildProduct {
    /// Rendered filename of the current artifact
    Artifact(String),
    /// Externally hosted URLs, returned unchanged - nothing was built
    External(Vec<String>),
}

impl BuildProduct {
    /// Artifact filename, if this package produced one
    pub fn filename(&self) -> Option<&str> {
        match self {
            BuildProduct::Artifact(name) => Some(name),
            BuildProduct::External(_) => None,
        }
    }
}

/// Packager - resolves the registry once and builds packages on demand
///
/// Holds no persistent state of its own: every build call is self-contained
/// and idempotent given the same source content. Overlapping builds of the
/// same package serialize on a per-package lock; the loser re-checks
/// staleness against the winner's fresh artifact and reuses it.
pub struct Packager<C, X>
where
    C: Compiler,
    X: Compressor,
{
    config: Config,
    registry: PackageRegistry,
    storage: Arc<dyn Storage>,
    compiler: C,
    compressor: X,
    css_engine: VersioningEngine,
    js_engine: VersioningEngine,
    sinks: Vec<Arc<dyn EventSink>>,
    force: bool,
    locks: Mutex<HashMap<(Kind, String), Arc<Mutex<()>>>>,
}

impl<C, X> Packager<C, X>
where
    C: Compiler,
    X: Compressor,
{
    /// Resolve the registry and set up per-kind versioning engines
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        compiler: C,
        compressor: X,
    ) -> PackResult<Self> {
        let registry = PackageRegistry::resolve(&config)?;
        let css_engine =
            VersioningEngine::new(storage.clone(), config.hash, config.css.placeholder.clone());
        let js_engine =
            VersioningEngine::new(storage.clone(), config.hash, config.js.placeholder.clone());

        Ok(Self {
            config,
            registry,
            storage,
            compiler,
            compressor,
            css_engine,
            js_engine,
            sinks: Vec::new(),
            force: false,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Rebuild unconditionally, bypassing the staleness check
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Register a sink for build completion events
    pub fn subscribe(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Resolved configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonical package table
    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    /// Independent copy of the canonical record for a name/kind pair
    pub fn package_for(&self, kind: Kind, name: &str) -> PackResult<Package> {
        self.registry
            .get(kind, name)
            .cloned()
            .ok_or_else(|| PackError::PackageNotFound {
                kind,
                name: name.to_string(),
            })
    }

    /// Public URL for a single source file
    pub fn individual_url(&self, path: &str) -> String {
        self.storage.url(path)
    }

    /// Build one package, returning its current artifact name or its
    /// externals list
    pub fn build(&self, kind: Kind, name: &str) -> PackResult<BuildProduct> {
        let package = self.package_for(kind, name)?;
        if package.is_external() {
            return Ok(BuildProduct::External(package.externals));
        }
        let filename = self.pack(kind, &package)?;
        Ok(BuildProduct::Artifact(filename))
    }

    /// Build every registered package of every kind
    ///
    /// Fails on the first package whose build fails; there is no partial-
    /// success mode.
    pub fn build_all(&self) -> PackResult<BTreeMap<(Kind, String), BuildProduct>> {
        let mut products = BTreeMap::new();
        for kind in Kind::ALL {
            for name in self.registry.packages(kind).keys() {
                products.insert((kind, name.clone()), self.build(kind, name)?);
            }
        }
        Ok(products)
    }

    /// Standalone compiled-template bundle for one package
    pub fn pack_templates(&self, kind: Kind, name: &str) -> PackResult<Vec<u8>> {
        let package = self.package_for(kind, name)?;
        self.compressor.compile_templates(&package)
    }

    fn engine(&self, kind: Kind) -> &VersioningEngine {
        match kind {
            Kind::Stylesheet => &self.css_engine,
            Kind::Script => &self.js_engine,
        }
    }

    fn lock_for(&self, kind: Kind, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry((kind, name.to_string())).or_default().clone()
    }

    /// CHECK -> (SKIP | REBUILD) -> DONE for one package
    fn pack(&self, kind: Kind, package: &Package) -> PackResult<String> {
        let lock = self.lock_for(kind, &package.name);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let cfg = self.config.kind(kind);
        let engine = self.engine(kind);
        let template = cfg.output_template(&package.output);

        if !cfg.auto && !self.force {
            // automatic builds are off: serve whatever is already on disk
            if !template.contains(engine.placeholder()) {
                // fixed-name mode, the artifact name is fully determined
                return Ok(template);
            }
            let version =
                engine
                    .version_from_file(&template)?
                    .ok_or_else(|| PackError::NoArtifact {
                        kind,
                        name: package.name.clone(),
                    })?;
            return Ok(engine.output_filename(&template, &version));
        }

        let (stale, version) = engine.needs_update(&template, &package.paths)?;
        if stale || self.force {
            let output = engine.output_filename(&template, &version);
            tracing::debug!(
                package = %package.name,
                kind = %kind,
                version = %version,
                "rebuilding package"
            );

            let mut sources = package.paths.clone();
            sources.extend(package.templates.iter().cloned());
            let sources = self.compiler.compile(&sources)?;

            let content = match kind {
                Kind::Stylesheet => self.compressor.compress_stylesheets(&sources, package)?,
                Kind::Script => self.compressor.compress_scripts(&sources, package)?,
            };

            self.storage
                .write(&output, &content)
                .map_err(|source| PackError::Write {
                    path: output.clone(),
                    source,
                })?;
            engine.cleanup(&template, &version)?;
            tracing::info!(package = %package.name, artifact = %output, "saved artifact");

            let event = BuildEvent::packed(kind, package.name.clone(), version.clone());
            for sink in &self.sinks {
                sink.on_event(&event);
            }
        }

        Ok(engine.output_filename(&template, &version))
    }
}

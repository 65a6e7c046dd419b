//! Package registry
//!
//! Resolves raw configuration into the canonical `Package` table: glob
//! patterns are expanded under the kind's root, matches are deduplicated in
//! first-occurrence order, and compilable templates are split from directly
//! includable paths. Resolution happens once per process; the table is
//! immutable afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;

use crate::config::{Config, KindConfig, PackageConfig};
use crate::error::{PackError, PackResult};
use crate::models::{Kind, Package};

/// Canonical package table for the process lifetime
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    stylesheets: BTreeMap<String, Package>,
    scripts: BTreeMap<String, Package>,
}

impl PackageRegistry {
    /// Resolve every configured package group
    ///
    /// Fails fast on structurally invalid groups; nothing is registered
    /// under a failing name. The only side effects are filesystem reads for
    /// glob expansion.
    pub fn resolve(config: &Config) -> PackResult<Self> {
        Ok(Self {
            stylesheets: resolve_kind(&config.root, &config.css)?,
            scripts: resolve_kind(&config.root, &config.js)?,
        })
    }

    /// Canonical record for a name/kind pair
    pub fn get(&self, kind: Kind, name: &str) -> Option<&Package> {
        self.packages(kind).get(name)
    }

    /// All packages of one kind, keyed by name
    pub fn packages(&self, kind: Kind) -> &BTreeMap<String, Package> {
        match kind {
            Kind::Stylesheet => &self.stylesheets,
            Kind::Script => &self.scripts,
        }
    }
}

fn resolve_kind(root: &Path, cfg: &KindConfig) -> PackResult<BTreeMap<String, Package>> {
    let base = if cfg.root.is_empty() {
        root.to_path_buf()
    } else {
        root.join(&cfg.root)
    };

    // one walk per kind; every group matches against the same listing
    let files = walk_files(&base);

    let mut packages = BTreeMap::new();
    for (name, group) in &cfg.packages {
        packages.insert(name.clone(), resolve_group(name, group, &files, cfg)?);
    }
    Ok(packages)
}

/// All files under `base`, as sorted forward-slash relative paths
fn walk_files(base: &Path) -> Vec<String> {
    if !base.is_dir() {
        tracing::warn!(root = %base.display(), "source root does not exist");
        return Vec::new();
    }

    let mut files: Vec<String> = WalkBuilder::new(base)
        .standard_filters(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(base).ok()?;
            Some(rel.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    files.sort();
    files
}

fn resolve_group(
    name: &str,
    group: &PackageConfig,
    files: &[String],
    cfg: &KindConfig,
) -> PackResult<Package> {
    if !group.external_urls.is_empty() {
        return Ok(Package {
            name: name.to_string(),
            externals: group.external_urls.clone(),
            ..Package::default()
        });
    }

    if group.source_filenames.is_empty() {
        return Err(PackError::Configuration {
            name: name.to_string(),
            message: "declares neither external_urls nor source_filenames".to_string(),
        });
    }

    let output = group
        .output_filename
        .clone()
        .ok_or_else(|| PackError::Configuration {
            name: name.to_string(),
            message: "missing output_filename".to_string(),
        })?;

    let mut resolved: Vec<String> = Vec::new();
    for pattern in &group.source_filenames {
        let matcher = compile_pattern(name, pattern)?;
        for file in files {
            if matcher.matched(file, false).is_ignore() && !resolved.iter().any(|p| p == file) {
                resolved.push(file.clone());
            }
        }
    }

    // identifiers are global-root-relative, so re-attach the kind root
    let kind_root = cfg.root.trim_matches('/');
    let qualify = |path: &str| {
        if kind_root.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", kind_root, path)
        }
    };

    let (templates, paths): (Vec<_>, Vec<_>) = resolved
        .iter()
        .partition(|path| path.ends_with(&cfg.template_ext));

    Ok(Package {
        name: name.to_string(),
        paths: paths.into_iter().map(|p| qualify(p)).collect(),
        templates: templates.into_iter().map(|p| qualify(p)).collect(),
        output,
        context: group.extra_context.clone(),
        template_name: group.template_name.clone(),
        variant: group.variant.clone(),
        externals: Vec::new(),
    })
}

/// Build a single-pattern matcher with glob semantics
///
/// Patterns are anchored at the root so `*` stays within one directory
/// level; `**` crosses levels.
fn compile_pattern(name: &str, pattern: &str) -> PackResult<Gitignore> {
    let anchored = if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{}", pattern)
    };

    let mut builder = GitignoreBuilder::new("");
    builder
        .add_line(None, &anchored)
        .map_err(|e| PackError::Configuration {
            name: name.to_string(),
            message: format!("invalid pattern '{}': {}", pattern, e),
        })?;
    builder.build().map_err(|e| PackError::Configuration {
        name: name.to_string(),
        message: format!("invalid pattern '{}': {}", pattern, e),
    })
}

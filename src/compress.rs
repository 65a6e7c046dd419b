//! External transformation seams
//!
//! The packager drives two external stages: a `Compiler` that turns
//! compilable template sources into intermediate identifiers, and a
//! `Compressor` that produces the final artifact bytes. Both are traits so
//! real minifiers and template engines plug in from outside; the built-in
//! implementations pass content through untouched - syntax-level
//! minification is not this crate's concern.

use std::sync::Arc;

use crate::error::{PackError, PackResult};
use crate::models::Package;
use crate::storage::Storage;

/// Compile stage: template sources in, intermediate identifiers out
///
/// Failures propagate to the build unchanged; there are no retries.
pub trait Compiler: Send + Sync {
    /// Transform compilable sources into identifiers readable through
    /// storage; non-compilable identifiers pass through unchanged
    fn compile(&self, sources: &[String]) -> PackResult<Vec<String>>;
}

/// Compiler that performs no transformation
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompiler;

impl Compiler for NoopCompiler {
    fn compile(&self, sources: &[String]) -> PackResult<Vec<String>> {
        Ok(sources.to_vec())
    }
}

/// Compress stage: source identifiers in, final artifact bytes out
///
/// The package record is handed through so implementations can honor
/// `variant`, `templates`, and the opaque `context` metadata.
pub trait Compressor: Send + Sync {
    /// Produce the final bytes for a style-sheet package
    fn compress_stylesheets(&self, sources: &[String], package: &Package) -> PackResult<Vec<u8>>;

    /// Produce the final bytes for a script package
    fn compress_scripts(&self, sources: &[String], package: &Package) -> PackResult<Vec<u8>>;

    /// Produce a standalone compiled-template bundle, outside the main
    /// pack flow
    fn compile_templates(&self, package: &Package) -> PackResult<Vec<u8>>;
}

/// Compressor that concatenates source content verbatim
///
/// The honest default: output bytes are the sources joined with a newline,
/// in package order. `variant` and `context` are ignored.
#[derive(Clone)]
pub struct ConcatCompressor {
    storage: Arc<dyn Storage>,
}

impl ConcatCompressor {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn concatenate(&self, sources: &[String]) -> PackResult<Vec<u8>> {
        let mut output = Vec::new();
        for (index, source) in sources.iter().enumerate() {
            if index > 0 {
                output.push(b'\n');
            }
            let content = self
                .storage
                .read(source)
                .map_err(|e| PackError::Read {
                    path: source.clone(),
                    source: e,
                })?;
            output.extend_from_slice(&content);
        }
        Ok(output)
    }
}

impl Compressor for ConcatCompressor {
    fn compress_stylesheets(&self, sources: &[String], _package: &Package) -> PackResult<Vec<u8>> {
        self.concatenate(sources)
    }

    fn compress_scripts(&self, sources: &[String], _package: &Package) -> PackResult<Vec<u8>> {
        self.concatenate(sources)
    }

    fn compile_templates(&self, package: &Package) -> PackResult<Vec<u8>> {
        self.concatenate(&package.templates)
    }
}

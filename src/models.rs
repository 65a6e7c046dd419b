//! Core data models for packmule
//!
//! Defines the fundamental data structures used throughout packmule:
//! - `Kind`: the asset category (style-sheets or scripts)
//! - `Package`: a named, ordered bundle of source files plus an output template
//! - `Version`: a content-derived token embedded in output filenames

use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset category, each with its own roots and package table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Style-sheet bundles
    #[serde(rename = "css")]
    Stylesheet,
    /// Script bundles
    #[serde(rename = "js")]
    Script,
}

impl Kind {
    /// All kinds, in build order
    pub const ALL: [Kind; 2] = [Kind::Stylesheet, Kind::Script];

    /// Short configuration/CLI name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Stylesheet => "css",
            Kind::Script => "js",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "css" => Ok(Kind::Stylesheet),
            "js" => Ok(Kind::Script),
            other => Err(format!("unknown kind '{}' (expected 'css' or 'js')", other)),
        }
    }
}

/// One named bundle of a given kind
///
/// Resolved once from configuration and immutable thereafter; callers get
/// independent clones so the canonical record cannot be mutated.
///
/// `paths` order is significant: it is the concatenation/compilation order
/// and therefore affects both the version token and the output bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Package {
    /// Unique key within the package's kind
    pub name: String,

    /// Resolved root-relative source identifiers, deduplicated,
    /// first-occurrence order
    pub paths: Vec<String>,

    /// Source paths classified as compilable templates, disjoint from `paths`
    pub templates: Vec<String>,

    /// Output filename template carrying at most one version placeholder
    pub output: String,

    /// Opaque metadata handed through to the compressor
    pub context: serde_json::Map<String, serde_json::Value>,

    /// Optional template name handed through to the compressor
    pub template_name: Option<String>,

    /// Optional variant selector handed through to the compressor
    pub variant: Option<String>,

    /// Already-hosted resource URLs; a package with externals is never built
    pub externals: Vec<String>,
}

impl Package {
    /// True when this package references already-hosted resources only
    pub fn is_external(&self) -> bool {
        !self.externals.is_empty()
    }
}

/// Content-derived version token
///
/// An opaque hex digest of a package's concatenated source content. Never
/// persisted on its own - it only exists embedded in an output filename or
/// transiently during a build decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// Wrap a digest string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Textual form, as embedded in output filenames
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

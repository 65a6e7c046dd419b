//! Configuration module for packmule
//!
//! Configuration hierarchy:
//! 1. Environment variables (PACKMULE_*)
//! 2. Project config (packmule.toml)
//! 3. User config (~/.config/packmule/config.toml)
//! 4. Built-in defaults (lowest priority)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};
use crate::models::Kind;
use crate::versioning::HashAlgorithm;

/// One configured package group, before resolution
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageConfig {
    /// Glob patterns expanded under the kind's root
    #[serde(default)]
    pub source_filenames: Vec<String>,

    /// Output filename template with at most one version placeholder
    #[serde(default)]
    pub output_filename: Option<String>,

    /// Already-hosted resource URLs; mutually exclusive with local sources
    #[serde(default)]
    pub external_urls: Vec<String>,

    /// Opaque metadata handed through to the compressor
    #[serde(default)]
    pub extra_context: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub template_name: Option<String>,

    #[serde(default)]
    pub variant: Option<String>,
}

/// Per-kind settings and package table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindConfig {
    /// Subdirectory under the global root that source patterns expand in
    #[serde(default)]
    pub root: String,

    /// Subdirectory under the global root that artifacts are written to
    #[serde(default)]
    pub output_root: String,

    /// Automatic-build toggle; when off, builds happen only under force
    #[serde(default = "default_true")]
    pub auto: bool,

    /// Placeholder token substituted with the version inside output
    /// filenames
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// File-extension suffix marking compilable templates
    #[serde(default = "default_template_ext")]
    pub template_ext: String,

    /// Named package definitions
    #[serde(default)]
    pub packages: BTreeMap<String, PackageConfig>,
}

impl Default for KindConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            output_root: String::new(),
            auto: true,
            placeholder: default_placeholder(),
            template_ext: default_template_ext(),
            packages: BTreeMap::new(),
        }
    }
}

impl KindConfig {
    /// Effective output template for `output`, joined under the output root
    pub fn output_template(&self, output: &str) -> String {
        if self.output_root.is_empty() {
            output.to_string()
        } else {
            format!(
                "{}/{}",
                self.output_root.trim_end_matches('/'),
                output.trim_start_matches('/')
            )
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_placeholder() -> String {
    "?".to_string()
}

fn default_template_ext() -> String {
    ".jst".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory all source and artifact identifiers resolve against
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Public URL prefix for individual file lookups
    #[serde(default)]
    pub url_prefix: String,

    /// Digest strategy for version tokens
    #[serde(default)]
    pub hash: HashAlgorithm,

    /// Style-sheet packages
    #[serde(default)]
    pub css: KindConfig,

    /// Script packages
    #[serde(default)]
    pub js: KindConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            url_prefix: String::new(),
            hash: HashAlgorithm::default(),
            css: KindConfig::default(),
            js: KindConfig::default(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// Non-fatal configuration warning surfaced to CLI users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
}

impl Config {
    /// Settings for one kind
    pub fn kind(&self, kind: Kind) -> &KindConfig {
        match kind {
            Kind::Stylesheet => &self.css,
            Kind::Script => &self.js,
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> PackResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (unknown keys)
    pub fn load_with_warnings(path: &Path) -> PackResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Self = serde_ignored::deserialize(deserializer, |path| {
            unknown_paths.push(path.to_string());
        })
        .map_err(|e| PackError::ConfigFile {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|path_str| {
                let key = path_str
                    .rsplit('.')
                    .next()
                    .unwrap_or(path_str.as_str())
                    .to_string();
                ConfigWarning {
                    line: find_line_number(&content, &key),
                    key,
                    file: path.to_path_buf(),
                }
            })
            .collect();

        Ok((config, warnings))
    }

    /// Load from project config, user config, or defaults
    pub fn load_or_default(project_root: Option<&Path>) -> Self {
        if let Some(root) = project_root {
            let project_config = root.join("packmule.toml");
            if project_config.exists() {
                if let Ok(config) = Self::load(&project_config) {
                    return config.with_env_overrides();
                }
            }
        }

        if let Some(user_config_dir) = dirs::config_dir() {
            let user_config = user_config_dir.join("packmule/config.toml");
            if user_config.exists() {
                if let Ok(config) = Self::load(&user_config) {
                    return config.with_env_overrides();
                }
            }
        }

        Self::default().with_env_overrides()
    }

    /// Apply environment variable overrides (PACKMULE_* prefix)
    pub fn with_env_overrides(mut self) -> Self {
        // PACKMULE_AUTO toggles automatic builds for both kinds
        if let Ok(val) = std::env::var("PACKMULE_AUTO") {
            let auto = val.to_lowercase() != "false" && val != "0";
            self.css.auto = auto;
            self.js.auto = auto;
        }

        // PACKMULE_HASH selects the digest strategy
        if let Ok(algorithm) = std::env::var("PACKMULE_HASH") {
            self.hash = match algorithm.to_lowercase().as_str() {
                "blake3" => HashAlgorithm::Blake3,
                _ => HashAlgorithm::Sha256,
            };
        }

        // PACKMULE_URL_PREFIX overrides the public URL prefix
        if let Ok(prefix) = std::env::var("PACKMULE_URL_PREFIX") {
            self.url_prefix = prefix;
        }

        self
    }
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.hash, HashAlgorithm::Sha256);
        assert!(config.css.auto);
        assert_eq!(config.css.placeholder, "?");
        assert_eq!(config.js.template_ext, ".jst");
        assert!(config.css.packages.is_empty());
    }

    #[test]
    fn test_config_parse_toml() {
        let toml = r#"
root = "assets"
url_prefix = "/static"
hash = "blake3"

[css]
output_root = "build"
auto = true

[css.packages.screen]
source_filenames = ["css/*.css"]
output_filename = "screen.?.css"
variant = "datauri"

[js.packages.app]
source_filenames = ["js/app/*.js", "js/shared/*.js"]
output_filename = "app.?.js"

[js.packages.cdn]
external_urls = ["https://cdn.example.com/lib.js"]
"#;

        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.root, PathBuf::from("assets"));
        assert_eq!(config.url_prefix, "/static");
        assert_eq!(config.hash, HashAlgorithm::Blake3);
        assert_eq!(config.css.output_root, "build");

        let screen = &config.css.packages["screen"];
        assert_eq!(screen.source_filenames, vec!["css/*.css".to_string()]);
        assert_eq!(screen.output_filename.as_deref(), Some("screen.?.css"));
        assert_eq!(screen.variant.as_deref(), Some("datauri"));

        let app = &config.js.packages["app"];
        assert_eq!(app.source_filenames.len(), 2);

        let cdn = &config.js.packages["cdn"];
        assert_eq!(cdn.external_urls.len(), 1);
        assert!(cdn.source_filenames.is_empty());
    }

    #[test]
    fn test_config_extra_context_passes_through_arbitrary_values() {
        let toml = r#"
[css.packages.print]
source_filenames = ["css/print.css"]
output_filename = "print.?.css"

[css.packages.print.extra_context]
media = "print"
priority = 2
"#;

        let config: Config = toml::from_str(toml).unwrap();
        let context = &config.css.packages["print"].extra_context;

        assert_eq!(context["media"], serde_json::json!("print"));
        assert_eq!(context["priority"], serde_json::json!(2));
    }

    #[test]
    fn test_kind_config_output_template_joins_output_root() {
        let mut cfg = KindConfig::default();
        assert_eq!(cfg.output_template("pack.?.css"), "pack.?.css");

        cfg.output_root = "build/".to_string();
        assert_eq!(cfg.output_template("pack.?.css"), "build/pack.?.css");
    }

    #[test]
    fn test_config_kind_lookup() {
        let mut config = Config::default();
        config.css.output_root = "css-out".to_string();
        config.js.output_root = "js-out".to_string();

        assert_eq!(config.kind(Kind::Stylesheet).output_root, "css-out");
        assert_eq!(config.kind(Kind::Script).output_root, "js-out");
    }

    #[test]
    fn test_config_load_with_warnings_reports_unknown_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("packmule.toml");

        fs::write(&path, "url_prefx = \"/static\"\n").unwrap();

        let (_config, warnings) = Config::load_with_warnings(&path).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, "url_prefx");
        assert_eq!(warnings[0].line, Some(1));
    }

    #[test]
    fn test_config_load_invalid_toml_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("packmule.toml");

        fs::write(&path, "css = \"not a table\"\n").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(PackError::ConfigFile { .. })));
    }

    #[test]
    fn test_env_override_auto() {
        std::env::set_var("PACKMULE_AUTO", "false");
        let config = Config::default().with_env_overrides();
        assert!(!config.css.auto);
        assert!(!config.js.auto);
        std::env::remove_var("PACKMULE_AUTO");
    }

    #[test]
    fn test_env_override_hash() {
        std::env::set_var("PACKMULE_HASH", "blake3");
        let config = Config::default().with_env_overrides();
        assert_eq!(config.hash, HashAlgorithm::Blake3);
        std::env::remove_var("PACKMULE_HASH");
    }
}

//! Command line interface definitions and command runners

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use packmule::{
    BuildProduct, ConcatCompressor, Config, Kind, LocalStorage, NoopCompiler, Packager, Storage,
};

/// Packmule - asset packager with content-derived versioning
#[derive(Parser, Debug)]
#[command(name = "packmule")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build packages into versioned artifacts
    Build {
        /// Rebuild unconditionally, bypassing the staleness check
        #[arg(short, long)]
        force: bool,

        /// Restrict to one kind (css or js)
        #[arg(short, long)]
        kind: Option<String>,

        /// Package names to build (all registered packages if omitted)
        names: Vec<String>,
    },

    /// List resolved packages and their member files
    List,
}

/// Load configuration from the explicit path, the project file, or defaults
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let (config, warnings) = Config::load_with_warnings(path)
                .with_context(|| format!("loading {}", path.display()))?;
            for warning in warnings {
                tracing::warn!(
                    key = %warning.key,
                    file = %warning.file.display(),
                    line = warning.line,
                    "unknown configuration key"
                );
            }
            Ok(config.with_env_overrides())
        }
        None => Ok(Config::load_or_default(Some(std::path::Path::new(".")))),
    }
}

fn packager(
    config: Config,
    force: bool,
) -> anyhow::Result<Packager<NoopCompiler, ConcatCompressor>> {
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(config.root.clone()).with_url_prefix(config.url_prefix.clone()),
    );
    let compressor = ConcatCompressor::new(storage.clone());
    let mut packager = Packager::new(config, storage, NoopCompiler, compressor)
        .context("resolving packages")?;
    if force {
        packager = packager.forced();
    }
    Ok(packager)
}

fn print_product(kind: Kind, name: &str, product: &BuildProduct) {
    match product {
        BuildProduct::Artifact(filename) => println!("{}/{}: {}", kind, name, filename),
        BuildProduct::External(urls) => {
            println!("{}/{}: external ({})", kind, name, urls.join(", "))
        }
    }
}

/// Run `packmule build`
pub fn run_build(
    config: Config,
    force: bool,
    kind: Option<String>,
    names: &[String],
) -> anyhow::Result<()> {
    let packager = packager(config, force)?;

    let kinds: Vec<Kind> = match kind {
        Some(raw) => vec![raw.parse().map_err(anyhow::Error::msg)?],
        None => Kind::ALL.to_vec(),
    };

    if names.is_empty() {
        if kinds.len() == Kind::ALL.len() {
            for ((kind, name), product) in packager.build_all()? {
                print_product(kind, &name, &product);
            }
            return Ok(());
        }
        for kind in &kinds {
            let registered: Vec<String> =
                packager.registry().packages(*kind).keys().cloned().collect();
            for name in registered {
                let product = packager.build(*kind, &name)?;
                print_product(*kind, &name, &product);
            }
        }
        return Ok(());
    }

    for name in names {
        let mut found = false;
        for kind in &kinds {
            match packager.build(*kind, name) {
                Ok(product) => {
                    found = true;
                    print_product(*kind, name, &product);
                }
                Err(packmule::PackError::PackageNotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if !found {
            anyhow::bail!("no package named '{}'", name);
        }
    }
    Ok(())
}

/// Run `packmule list`
pub fn run_list(config: Config) -> anyhow::Result<()> {
    let packager = packager(config, false)?;

    for kind in Kind::ALL {
        for (name, package) in packager.registry().packages(kind) {
            if package.is_external() {
                println!("{}/{}: external ({})", kind, name, package.externals.join(", "));
                continue;
            }
            println!(
                "{}/{}: {} -> {} ({} paths, {} templates)",
                kind,
                name,
                package.paths.join(" "),
                package.output,
                package.paths.len(),
                package.templates.len()
            );
        }
    }
    Ok(())
}

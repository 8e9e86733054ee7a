//! Command-line handling for graft

mod paths;
mod summary;

use anyhow::{bail, Context, Result};
use clap::Parser;
use graft_config::config::DEFAULT_LIBRARY;
use graft_config::logging::{self, run_span};
use graft_config::{ConfigOverrides, GraftConfig, LogFormat, LoggingOverrides};
use graft_engine::{LocalFileStore, PrimitiveRequest, UpdateOptions, Updater};
use std::path::PathBuf;
use tracing::debug;

/// The main CLI struct.
#[derive(Parser, Debug)]
#[command(name = "graft")]
#[command(about = "Copy library modules into a project and rewrite their imports")]
#[command(version)]
#[command(override_usage = "graft [OPTIONS] [CONFIGFILE_OR_DESTDIR]")]
pub struct Cli {
    /// A config file, or a project directory containing `<library>.conf`
    pub configfile_or_destdir: Option<PathBuf>,

    /// Config file to load (`.toml`, or INI with a `[DEFAULT]` section)
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Destination project directory
    #[arg(long)]
    pub dest_dir: Option<PathBuf>,

    /// Primitives to copy (e.g. `flow.linear_flow,task`)
    #[arg(long, value_delimiter = ',')]
    pub primitives: Option<Vec<String>>,

    /// Base module of the destination project
    #[arg(long)]
    pub base: Option<String>,

    /// Directory containing the library's root package
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Root module of the library to copy
    #[arg(long)]
    pub library: Option<String>,

    /// Namespace the destination project vendors shared modules under
    #[arg(long)]
    pub shared_namespace: Option<String>,

    /// Remove the previously copied library tree first
    #[arg(long)]
    pub clean: bool,

    /// Log every copied file and rewritten import
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_parser = ["compact", "pretty", "json"])]
    pub log_format: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            primitives: self.primitives.clone(),
            base: self.base.clone(),
            dest_dir: self.dest_dir.clone(),
            source_dir: self.source_dir.clone(),
            library: self.library.clone(),
            shared_namespace: self.shared_namespace.clone(),
            clean: self.clean.then_some(true),
            logging: LoggingOverrides {
                level: self.verbose.then(|| "debug".to_string()),
                format: self.log_format.as_deref().map(|format| match format {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => LogFormat::Compact,
                }),
            },
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let library = cli.library.as_deref().unwrap_or(DEFAULT_LIBRARY);
    let located = paths::locate_config(
        cli.configfile_or_destdir.as_deref(),
        cli.config_file.as_deref(),
        library,
    );

    let config = GraftConfig::load(located.config_file.as_deref(), &cli.overrides())?;
    logging::initialize(&config.logging);
    debug!(config_file = ?located.config_file, "Resolved configuration");

    // Reject bad requests before looking at the filesystem
    let primitives = PrimitiveRequest::parse(&config.primitives)?;

    let dest_dir = paths::resolve_dest_dir(&config, &located)?;
    let Some(base) = config.base.clone() else {
        bail!("A destination base module is required");
    };

    let options = UpdateOptions {
        source_dir: config.source_dir.clone(),
        library: config.library.clone(),
        base,
        dest_dir,
        shared_namespace: config.shared_namespace.clone(),
        primitives,
        clean: config.clean,
    };

    let span = run_span(&options.base, &options.library);
    let _enter = span.enter();

    let report = Updater::new(&LocalFileStore)
        .run(&options)
        .with_context(|| format!("Failed to update '{}'", options.dest_dir.display()))?;

    summary::print_report(&report, &options);
    Ok(())
}

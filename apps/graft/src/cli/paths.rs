//! Config file and destination directory resolution

use anyhow::{Context, Result};
use graft_config::{config_file_name, GraftConfig};
use graft_foundation::GraftError;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// What the command line says about where to look
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LocatedConfig {
    pub config_file: Option<PathBuf>,
    /// Directory given positionally, used when nothing names a destination
    pub project_dir: Option<PathBuf>,
}

/// Work out the config file from `--config-file` and the positional argument
///
/// The positional argument is a config file when it is a file; a directory
/// holding `<library>.conf` makes that file the config file. `--config-file`
/// always wins.
pub fn locate_config(
    positional: Option<&Path>,
    explicit: Option<&Path>,
    library: &str,
) -> LocatedConfig {
    let mut located = LocatedConfig {
        config_file: explicit.map(Path::to_path_buf),
        project_dir: None,
    };

    let Some(positional) = positional else {
        return located;
    };

    if positional.is_dir() {
        located.project_dir = Some(positional.to_path_buf());
        let candidate = positional.join(config_file_name(library));
        if located.config_file.is_none() && candidate.is_file() {
            located.config_file = Some(candidate);
        }
    } else if located.config_file.is_none() {
        located.config_file = Some(positional.to_path_buf());
    }

    located
}

/// Pick the destination directory
///
/// Configured `dest_dir` first, then the directory of the config file, then
/// a positional project directory. On a terminal the user is asked when none
/// of those is a directory.
pub fn resolve_dest_dir(config: &GraftConfig, located: &LocatedConfig) -> Result<PathBuf> {
    let candidate = match (&config.dest_dir, &located.config_file) {
        (Some(dest), _) => Some(dest.clone()),
        (None, Some(file)) => Some(config_dir(file)?),
        (None, None) => located.project_dir.clone(),
    };

    if let Some(dest) = candidate.filter(|d| d.is_dir()) {
        return Ok(dest);
    }

    if io::stdin().is_terminal() {
        if let Some(dest) = prompt_dest_dir()? {
            return Ok(dest);
        }
    }

    Err(GraftError::destination_unavailable("A valid destination dir is required").into())
}

fn config_dir(file: &Path) -> Result<PathBuf> {
    let file = file
        .canonicalize()
        .with_context(|| format!("Failed to resolve config file '{}'", file.display()))?;
    Ok(file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn prompt_dest_dir() -> Result<Option<PathBuf>> {
    eprint!("Destination directory: ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let dest = PathBuf::from(input.trim());

    Ok((!input.trim().is_empty() && dest.is_dir()).then_some(dest))
}

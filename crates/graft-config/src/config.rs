//! Layered configuration for graft runs

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use graft_foundation::module_name::is_valid_module_name;
use graft_foundation::{GraftError, GraftResult, IniDocument};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Library copied when nothing else is configured
pub const DEFAULT_LIBRARY: &str = "taskflow";

/// Namespace consumers use for their own vendored common code
pub const DEFAULT_SHARED_NAMESPACE: &str = "openstack.common";

/// Section holding the settings of INI-style config files
pub const INI_SECTION: &str = "DEFAULT";

/// Prefix of environment variable overrides (`GRAFT_BASE`, `GRAFT_LOGGING__LEVEL`, ...)
pub const ENV_PREFIX: &str = "GRAFT_";

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraftConfig {
    /// Primitives to copy (`flow.linear_flow`, `engines.action`, `task`, ...)
    #[serde(default)]
    pub primitives: Vec<String>,
    /// Base module of the consuming project that will hold the copy
    pub base: Option<String>,
    /// Destination project directory
    pub dest_dir: Option<PathBuf>,
    /// Directory containing the library's root package
    pub source_dir: PathBuf,
    /// Root module name of the library being copied
    pub library: String,
    /// Dotted namespace the consumer vendors shared modules under
    pub shared_namespace: String,
    /// Remove a previously copied library tree before copying
    pub clean: bool,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human-readable output
    #[default]
    Compact,
    /// Multi-line human-readable output
    Pretty,
    /// Structured JSON output
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Default for GraftConfig {
    fn default() -> Self {
        Self {
            primitives: Vec::new(),
            base: None,
            dest_dir: None,
            source_dir: PathBuf::from("."),
            library: DEFAULT_LIBRARY.to_string(),
            shared_namespace: DEFAULT_SHARED_NAMESPACE.to_string(),
            clean: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Values explicitly given on the command line; `None` leaves lower layers alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primitives: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<bool>,
    pub logging: LoggingOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoggingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,
}

/// Name of the config file looked up in a destination directory
///
/// ```rust
/// assert_eq!(graft_config::config_file_name("taskflow"), "taskflow.conf");
/// ```
pub fn config_file_name(library: &str) -> String {
    format!("{}.conf", library)
}

impl GraftConfig {
    /// Load configuration
    ///
    /// Priority order (highest to lowest):
    /// 1. Command-line overrides
    /// 2. Environment variables (`GRAFT_*`, `__` separates nested keys)
    /// 3. The config file, if given (`.toml` files are TOML, anything else is
    ///    INI with a `[DEFAULT]` section)
    /// 4. Default values
    pub fn load(config_file: Option<&Path>, overrides: &ConfigOverrides) -> GraftResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(GraftConfig::default()));

        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(GraftError::config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "Loading configuration file");
            figment = if path.extension().is_some_and(|ext| ext == "toml") {
                figment.merge(Toml::file(path))
            } else {
                figment.merge(Serialized::defaults(IniValues::read(path)?))
            };
        }

        // Primitives come comma separated, as in INI files
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["primitives"]));
        if let Ok(raw) = std::env::var(format!("{}PRIMITIVES", ENV_PREFIX)) {
            figment = figment.merge(Serialized::default("primitives", split_list(&raw)));
        }
        let figment = figment.merge(Serialized::defaults(overrides));

        let config: GraftConfig = figment
            .extract()
            .map_err(|e| GraftError::config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;

        tracing::debug!(
            library = %config.library,
            primitives = config.primitives.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> GraftResult<()> {
        if !is_valid_module_name(&self.library) {
            return Err(GraftError::config(format!(
                "Invalid library name '{}'",
                self.library
            )));
        }

        if !is_valid_module_name(&self.shared_namespace) {
            return Err(GraftError::config(format!(
                "Invalid shared namespace '{}'",
                self.shared_namespace
            )));
        }

        if let Some(base) = &self.base {
            if !is_valid_module_name(base) {
                return Err(GraftError::config(format!(
                    "Invalid base module '{}'",
                    base
                )));
            }
        }

        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(GraftError::config(format!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

/// Settings read from an INI-style config file
#[derive(Debug, Default, Serialize)]
struct IniValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    primitives: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dest_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    library: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shared_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clean: Option<bool>,
}

impl IniValues {
    fn read(path: &Path) -> GraftResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| GraftError::io(path, e))?;
        let doc = IniDocument::parse(&content);

        // Accept both spellings used by older config files
        let get = |key: &str| {
            doc.get(INI_SECTION, key)
                .or_else(|| doc.get(INI_SECTION, &key.replace('_', "-")))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let clean = match get("clean") {
            Some(raw) => Some(parse_bool(&raw).ok_or_else(|| {
                GraftError::config(format!(
                    "Invalid boolean '{}' for 'clean' in '{}'",
                    raw,
                    path.display()
                ))
            })?),
            None => None,
        };

        Ok(Self {
            primitives: get("primitives").map(|raw| split_list(&raw)),
            base: get("base"),
            dest_dir: get("dest_dir").map(PathBuf::from),
            source_dir: get("source_dir").map(PathBuf::from),
            library: get("library"),
            shared_namespace: get("shared_namespace"),
            clean,
        })
    }
}

/// Split a `a, b` (or `[a, b]`) list, one entry per comma or line
fn split_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(raw);
    raw.split([',', '\n'])
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

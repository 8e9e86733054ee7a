//! Error handling for the graft engine and its collaborators

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where in a source file a diagnostic originated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Location {
    /// No line information is available (e.g. a requested primitive)
    #[default]
    Unknown,
    /// A specific line of a specific file (1-based line number)
    Line {
        file: PathBuf,
        line_number: usize,
        text: String,
    },
}

impl Location {
    /// Create a location pointing at one line of a file
    pub fn line(file: impl Into<PathBuf>, line_number: usize, text: impl Into<String>) -> Self {
        Self::Line {
            file: file.into(),
            line_number,
            text: text.into(),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Unknown => None,
            Self::Line { file, .. } => Some(file),
        }
    }

    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Unknown => None,
            Self::Line { line_number, .. } => Some(*line_number),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => Ok(()),
            Self::Line {
                file,
                line_number,
                text,
            } => write!(
                f,
                " at '{}'; line {} from file '{}'",
                text.trim(),
                line_number,
                file.display()
            ),
        }
    }
}

/// Core error type used throughout graft
///
/// Every variant is fatal for the run that produced it: the engine has no
/// internal recovery, files written before the failure stay in place.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GraftError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Unable to find module '{module}'{location}")]
    ModuleNotFound { module: String, location: Location },

    #[error("Invalid import ({reason}){location}")]
    MalformedImport { reason: String, location: Location },

    #[error("Destination unavailable: {message}")]
    DestinationUnavailable { message: String },

    #[error("Invalid source tree '{}': {message}", .path.display())]
    SourceTree { path: PathBuf, message: String },

    #[error("Manifest error in '{}': {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraftError {
    /// Create a new invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new module not found error
    pub fn module_not_found(module: impl Into<String>, location: Location) -> Self {
        Self::ModuleNotFound {
            module: module.into(),
            location,
        }
    }

    /// Create a new malformed import error
    pub fn malformed_import(reason: impl Into<String>, location: Location) -> Self {
        Self::MalformedImport {
            reason: reason.into(),
            location,
        }
    }

    /// Create a new destination unavailable error
    pub fn destination_unavailable(message: impl Into<String>) -> Self {
        Self::DestinationUnavailable {
            message: message.into(),
        }
    }

    /// Create a new source tree error
    pub fn source_tree(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SourceTree {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new manifest error
    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new I/O error tied to the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Machine-readable error code, see [`error_codes`]
    pub fn code(&self) -> &'static str {
        use error_codes::*;

        match self {
            Self::InvalidRequest { .. } => E2001_INVALID_REQUEST,
            Self::ModuleNotFound { .. } => E2002_MODULE_NOT_FOUND,
            Self::MalformedImport { .. } => E2003_MALFORMED_IMPORT,
            Self::DestinationUnavailable { .. } => E2004_DESTINATION_UNAVAILABLE,
            Self::SourceTree { .. } => E2005_SOURCE_TREE,
            Self::Manifest { .. } => E2006_MANIFEST,
            Self::Config { .. } => E2007_CONFIG,
            Self::Io { .. } => E2008_IO,
        }
    }

    /// The source location attached to this error, if any
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::ModuleNotFound { location, .. } | Self::MalformedImport { location, .. } => {
                Some(location)
            }
            _ => None,
        }
    }
}

/// Result type alias for convenience
pub type GraftResult<T> = Result<T, GraftError>;

/// Attach a path to bare `std::io` results
pub trait IoResultExt<T> {
    fn with_path(self, path: &Path) -> GraftResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: &Path) -> GraftResult<T> {
        self.map_err(|e| GraftError::io(path, e))
    }
}

/// Standardized error codes reported by the command line
pub mod error_codes {
    /// Unknown primitive category or malformed primitive list
    pub const E2001_INVALID_REQUEST: &str = "E2001";
    /// A primitive or import could not be traced to a file
    pub const E2002_MODULE_NOT_FOUND: &str = "E2002";
    /// A line of the library's import grammar could not be parsed
    pub const E2003_MALFORMED_IMPORT: &str = "E2003";
    /// No usable destination directory
    pub const E2004_DESTINATION_UNAVAILABLE: &str = "E2004";
    /// The source tree root is missing or not a directory
    pub const E2005_SOURCE_TREE: &str = "E2005";
    /// Packaging metadata could not be read or merged
    pub const E2006_MANIFEST: &str = "E2006";
    /// Invalid configuration
    pub const E2007_CONFIG: &str = "E2007";
    /// Filesystem failure
    pub const E2008_IO: &str = "E2008";
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_module_not_found_carries_location() {
        let err = GraftError::module_not_found(
            "utils.missing",
            Location::line("taskflow/task.py", 7, "from taskflow.utils import missing\n"),
        );
        assert_eq!(
            err.to_string(),
            "Unable to find module 'utils.missing' at 'from taskflow.utils import missing'; \
             line 7 from file 'taskflow/task.py'"
        );
        assert_eq!(err.code(), error_codes::E2002_MODULE_NOT_FOUND);
        assert_eq!(err.location().and_then(Location::line_number), Some(7));
    }

    #[test]
    fn test_unknown_location_is_silent() {
        let err = GraftError::module_not_found("engines.nope.engine", Location::Unknown);
        assert_eq!(err.to_string(), "Unable to find module 'engines.nope.engine'");
        assert_eq!(err.location().and_then(Location::file), None);
    }

    #[test]
    fn test_io_error_mentions_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GraftResult<()> = Err(io).with_path(Path::new("/tmp/x.py"));
        let err = err.unwrap_err();
        assert!(err.to_string().contains("/tmp/x.py"));
        assert_eq!(err.code(), "E2008");
    }
}

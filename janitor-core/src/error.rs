//! Typed error handling for janitor.
//!
//! Only configuration-class errors (`InvalidRoot`, `Config`, `Discovery`)
//! abort a run. Everything else is recovered locally and attached to the
//! entity or file it concerns.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for janitor operations.
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Root path missing, not a directory, or unreadable
    #[error("Invalid root {path}: {message}")]
    InvalidRoot { path: PathBuf, message: String },

    /// Needle constructed without usable patterns
    #[error("Invalid needle '{needle}': {message}")]
    InvalidNeedle { needle: String, message: String },

    /// A needle fragment or the combined pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A single file could not be read during corpus loading
    #[error("Unreadable file {path}: {message}")]
    ScanFileUnreadable { path: PathBuf, message: String },

    /// Any other failure while analyzing one entity
    #[error("Analysis of '{entity}' failed: {message}")]
    AnalysisFailure {
        entity: String,
        message: String,
        #[source]
        source: Option<Box<JanitorError>>,
    },

    /// Entity discovery failed for the whole entity type
    #[error("Discovery of {kind} entities failed: {message}")]
    Discovery { kind: String, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// I/O error when reading files or directories
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl JanitorError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    pub fn invalid_root(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_needle(needle: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidNeedle {
            needle: needle.into(),
            message: message.into(),
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ScanFileUnreadable {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn discovery(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Discovery {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Entity-level failure with no underlying typed cause.
    pub fn analysis_failure(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AnalysisFailure {
            entity: entity.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an unexpected cause as an entity-level analysis failure.
    ///
    /// Needle and pattern errors already name what went wrong and are
    /// returned unchanged.
    pub fn for_entity(self, entity: &str) -> Self {
        match self {
            Self::InvalidNeedle { .. }
            | Self::InvalidPattern { .. }
            | Self::AnalysisFailure { .. } => self,
            other => Self::AnalysisFailure {
                entity: entity.to_string(),
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Short machine-readable label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRoot { .. } => "invalid_root",
            Self::InvalidNeedle { .. } => "invalid_needle",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::ScanFileUnreadable { .. } => "scan_file_unreadable",
            Self::AnalysisFailure { .. } => "analysis_failure",
            Self::Discovery { .. } => "discovery",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
        }
    }

    /// Check if this is a recoverable error (the run can continue).
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidRoot { .. } | Self::Config { .. } | Self::Discovery { .. }
        )
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::InvalidRoot { path, .. } => Some(path),
            Self::ScanFileUnreadable { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for janitor results.
pub type JanitorResult<T> = Result<T, JanitorError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> JanitorResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> JanitorResult<T> {
        self.map_err(|e| JanitorError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = JanitorError::io(
            PathBuf::from("/app/routes/web.php"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, JanitorError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/app/routes/web.php")));
        assert!(err.to_string().contains("/app/routes/web.php"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(JanitorError::invalid_needle("route-call", "no patterns").is_recoverable());
        assert!(JanitorError::unreadable("/a.bin", "binary").is_recoverable());
        assert!(!JanitorError::invalid_root("/missing", "does not exist").is_recoverable());
        assert!(!JanitorError::discovery("route", "boom").is_recoverable());
    }

    #[test]
    fn test_for_entity_keeps_needle_errors() {
        let err = JanitorError::invalid_needle("empty", "no patterns").for_entity("home");
        assert_eq!(err.kind(), "invalid_needle");

        let err = JanitorError::io("/x", std::io::Error::other("denied")).for_entity("home");
        assert_eq!(err.kind(), "analysis_failure");
        assert!(err.to_string().contains("home"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let janitor_result = result.with_path("/missing/file.php");
        assert!(janitor_result.is_err());
    }
}

//! Error types for fujiscout.
//!
//! Errors fall into two groups. Per-file problems (a name that does not fit the
//! configured format, a file that cannot be opened or decoded) are recovered
//! locally: the engine logs them and moves on to the next file. Everything else
//! (bad configuration, a work queue that cannot be persisted, an output file
//! that cannot be written) aborts the run and is surfaced to the caller.
//!
//! ```rust,ignore
//! match scan(&config, &mut observer, &cancel) {
//!     Ok(summary) => println!("{} matches", summary.total_matches),
//!     Err(ScanError::ConfigError(msg)) => eprintln!("bad input: {msg}"),
//!     Err(e) => eprintln!("scan aborted: {e}"),
//! }
//! ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while configuring or running a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Malformed file name '{name}': {reason}")]
    MalformedName { name: String, reason: String },
    #[error("Cannot access {path}: {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("Work queue persistence failed for {path}: {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write results to {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ScanError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn malformed_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }

    /// Whether the engine may skip the offending file and keep scanning.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedName { .. } | Self::FileAccess { .. } | Self::EncodingError { .. }
        )
    }
}

//! Error types for unbundle
//!
//! All modules use `UnbundleResult<T>` as their return type. A resource that
//! cannot be found is never an error: resolution degrades to the literal path.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for unbundle operations
pub type UnbundleResult<T> = Result<T, UnbundleError>;

/// All errors that can occur while resolving or extracting a resource
#[derive(Error, Debug)]
pub enum UnbundleError {
    // Extraction errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Cache path escapes the cache root: {0}")]
    PathEscapesCache(String),

    // Provider contract errors
    #[error("Unsupported locator scheme '{scheme}' in {locator}")]
    UnsupportedScheme { scheme: String, locator: String },

    #[error("Invalid locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("Invalid resource: {0} was listed but cannot be resolved")]
    InconsistentListing(String),

    #[error("Archive nesting too deep resolving {name} (depth {depth})")]
    NestingTooDeep { name: String, depth: usize },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },
}

impl UnbundleError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an archive error for the archive at `path`
    pub fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid locator error
    pub fn invalid_locator(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the resource provider broke its contract.
    ///
    /// These are not expected in normal operation and retrying cannot help.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedScheme { .. }
                | Self::InvalidLocator { .. }
                | Self::InconsistentListing(_)
        )
    }
}

//! Fatal startup errors.
//!
//! Everything in this taxonomy aborts the process before any task runs:
//! the whole task graph depends on the resolved configuration and banner,
//! so there is nothing useful to do once one of these fires.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building the startup context.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The configuration file for the resolved environment does not exist.
    #[error("configuration not found: {path} (resolved environment '{env}')")]
    ConfigNotFound { env: String, path: PathBuf },

    /// The configuration file exists but is not valid JSON.
    #[error("failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A banner template references a placeholder that is not in the
    /// render context. No partial render is attempted.
    #[error("template render failed ({origin}): unknown placeholder '{placeholder}'")]
    TemplateRender { origin: String, placeholder: String },

    /// The package manifest could not be read or parsed.
    #[error("package manifest missing or unreadable: {path}: {reason}")]
    ManifestMissing { path: PathBuf, reason: String },
}

impl StartupError {
    pub fn manifest_missing(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        StartupError::ManifestMissing {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for startup operations.
pub type StartupResult<T> = std::result::Result<T, StartupError>;

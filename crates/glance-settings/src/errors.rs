//! Settings errors.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Failures while loading or parsing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading the settings file failed.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings document is not valid JSON or has the wrong shape.
    #[error("invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),
}

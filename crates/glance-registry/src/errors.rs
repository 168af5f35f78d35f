//! Loader errors.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading an integrations directory.
///
/// Only root-level problems surface as errors; problems inside a single
/// integration's directory are logged and skip that integration.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The integrations root could not be read at all.
    #[error("failed to read integrations directory {path}: {source}")]
    RootUnreadable {
        /// Directory that failed to enumerate.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

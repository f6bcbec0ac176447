//! Error types for the snapshot pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing a snapshot
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to launch or configure the browser
    #[error("Browser initialization failed: {0}")]
    InitializationError(String),

    /// The page never reached the expected rendered state
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// A single asset could not be fetched. Recorded per asset, never fatal.
    #[error("Could not download {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    /// The job-posting container was not present in the rendered markup
    #[error("Could not find job posting content ({0})")]
    ContainerNotFound(String),

    /// Writing the output file failed
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration (site profile, selector, CLI value)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    Cdp(String),
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Cdp(err.to_string())
    }
}

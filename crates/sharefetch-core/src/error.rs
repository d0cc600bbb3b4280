//! Error types for sharefetch
//!
//! Every fallible operation in the extraction pipeline returns [`Result`].
//! We use the `thiserror` crate to keep the definitions short.
//!
//! ## Error classes
//!
//! - Connection-level errors (`Connection`, `NoShares`) are fatal: the run
//!   cannot start without a catalog.
//! - Table-level errors (`Fetch`, `Io`, `Arrow`) are isolated per table by the
//!   batch orchestrator and end up in the run report instead of aborting it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors that can occur while extracting a share
#[derive(Error, Debug)]
pub enum Error {
    /// The sharing endpoint could not be reached or the profile is unusable
    ///
    /// Raised while connecting, listing shares or listing tables.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The credential does not see any share
    #[error("No shares are visible with this profile")]
    NoShares,

    /// Loading the contents of one table failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A composite table locator could not be parsed
    #[error("Invalid table locator '{0}': expected <profile>#<share>.<schema>.<table>")]
    InvalidLocator(String),

    /// The table name pattern is not a valid regular expression
    #[error("Invalid table pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Filesystem error, tagged with the path involved
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Arrow encoding/decoding error (CSV writing, batch projection)
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a Connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a Fetch error from a string
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Creates a Config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wraps an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

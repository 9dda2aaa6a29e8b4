//! Error types for usersync-directory.

use thiserror::Error;

/// All errors that can arise from a remote directory lookup.
///
/// Every variant is recoverable at the reconciliation level: the affected
/// team is logged and skipped, the run continues.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The requested team has no counterpart in the source.
    #[error("team '{name}' not found in directory source")]
    TeamNotFound { name: String },

    /// Transport or HTTP-status failure talking to the source.
    #[error("directory request failed: {0}")]
    Http(Box<ureq::Error>),

    /// Failed to read a response body.
    #[error("failed to read directory response: {0}")]
    Io(#[from] std::io::Error),

    /// A manifest object or API response was not valid JSON of the expected
    /// shape.
    #[error("malformed directory response: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ureq::Error> for DirectoryError {
    fn from(e: ureq::Error) -> Self {
        DirectoryError::Http(Box::new(e))
    }
}

//! Error types for usersync-os.

use thiserror::Error;

/// All errors that can arise from OS account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Failed to spawn the external utility at all (not installed, no PATH).
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The utility ran but exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// Output from a utility did not have the expected shape.
    #[error("could not parse {program} output: {detail}")]
    Parse {
        program: &'static str,
        detail: String,
    },

    /// The named group does not exist in the group database.
    #[error("group '{name}' not found")]
    GroupNotFound { name: String },
}

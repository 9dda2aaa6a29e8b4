//! Error types for usersync-engine.

use std::path::PathBuf;

use thiserror::Error;

use usersync_core::types::Login;
use usersync_os::AccountError;

/// All errors that can arise from syncing one user's key file.
#[derive(Debug, Error)]
pub enum KeyFileError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not resolve the uid/gid to apply to the key file.
    #[error("cannot resolve file owner for '{login}': {source}")]
    Owner {
        login: Login,
        #[source]
        source: AccountError,
    },
}

/// Convenience constructor for [`KeyFileError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> KeyFileError {
    KeyFileError::Io {
        path: path.into(),
        source,
    }
}

/// Failure while processing a single desired user. Never fatal for the run;
/// the reconciler logs it and moves to the next user.
#[derive(Debug, Error)]
pub enum SyncUserError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    KeyFile(#[from] KeyFileError),
}

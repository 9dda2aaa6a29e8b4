//! Error types for usersync-core.

use thiserror::Error;

/// All errors that can arise while loading configuration.
///
/// Configuration errors are the only fatal startup errors in the system;
/// everything downstream is logged and skipped.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent.
    #[error("missing required environment variable {name}")]
    MissingEnv { name: &'static str },

    /// `TEAM_NAMES` was present but contained no usable team names.
    #[error("TEAM_NAMES contains no team names")]
    NoTeams,

    /// Neither a directory API credential nor a manifest bucket was configured.
    #[error("no directory source configured; set DIRECTORY_TOKEN + DIRECTORY_ORG or MANIFEST_BUCKET")]
    NoSource,
}

//! Environment-style configuration.
//!
//! # Variables
//!
//! - `TEAM_NAMES` — comma-separated directory team names (any case). Required.
//! - `DIRECTORY_TOKEN` + `DIRECTORY_ORG` — credential and organization for the
//!   API-backed directory source.
//! - `MANIFEST_BUCKET` — object-store identifier for the manifest-backed
//!   source. Either a full base URL or a bare bucket name.
//!
//! One of the two sources must be configured; when both are present the
//! API-backed source wins.
//!
//! # API pattern
//!
//! [`Config::from_env`] reads the real process environment and delegates to
//! [`Config::from_lookup`], which takes the lookup function explicitly. Tests
//! must NEVER call `from_env`; always use `from_lookup` with a map.

use crate::error::ConfigError;
use crate::types::TeamName;

/// Which remote directory source to reconcile against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// Live API-backed directory: GitHub organization team membership.
    GitHub { token: String, org: String },
    /// Static manifest store: pre-computed `teams/<team>.json` objects.
    Manifest { bucket: String },
}

/// Fully-resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub teams: Vec<TeamName>,
    pub source: SourceConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an explicit lookup function.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = get("TEAM_NAMES").ok_or(ConfigError::MissingEnv { name: "TEAM_NAMES" })?;
        let teams: Vec<TeamName> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TeamName::from)
            .collect();
        if teams.is_empty() {
            return Err(ConfigError::NoTeams);
        }

        let source = if let Some(token) = get("DIRECTORY_TOKEN") {
            let org = get("DIRECTORY_ORG").ok_or(ConfigError::MissingEnv {
                name: "DIRECTORY_ORG",
            })?;
            SourceConfig::GitHub { token, org }
        } else if let Some(bucket) = get("MANIFEST_BUCKET") {
            SourceConfig::Manifest { bucket }
        } else {
            return Err(ConfigError::NoSource);
        };

        Ok(Config { teams, source })
    }
}

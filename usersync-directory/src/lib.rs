//! # usersync-directory
//!
//! Remote directory source adapters.
//!
//! A [`DirectorySource`] yields the desired `(login, ssh_keys)` records for a
//! named team. Two implementations exist:
//!
//! - [`GitHubDirectory`] — live lookup against a GitHub organization's teams,
//!   with each member's public keys fetched from the user-keys endpoint.
//! - [`ManifestDirectory`] — pre-computed `teams/<team>.json` objects served
//!   from an object store over HTTP.
//!
//! Both produce the same [`DesiredUser`] shape, so the reconciliation engine
//! never sees source-specific representations.

pub mod error;
pub mod github;
pub mod manifest;

use usersync_core::types::{DesiredUser, TeamName};

pub use error::DirectoryError;
pub use github::GitHubDirectory;
pub use manifest::{bucket_url, ManifestDirectory};

/// A remote source of truth for team membership and SSH keys.
pub trait DirectorySource {
    /// Desired users for one team. `team` is expected pre-normalized
    /// (lowercase); implementations match it case-insensitively against the
    /// source's own naming.
    ///
    /// Returns [`DirectoryError::TeamNotFound`] when the source has no such
    /// team — callers treat that (and every other variant) as log-and-skip.
    fn team_members(&self, team: &TeamName) -> Result<Vec<DesiredUser>, DirectoryError>;
}

//! Manifest-backed directory source.
//!
//! One JSON object per team, keyed `teams/<team-lowercase>.json`:
//!
//! ```json
//! { "members": [ { "login": "aad", "ssh_keys": ["ssh-rsa ..."] } ] }
//! ```
//!
//! A missing object maps to [`DirectoryError::TeamNotFound`]; a malformed one
//! to [`DirectoryError::Json`]. Both are skip-and-continue at the
//! reconciliation level.

use usersync_core::types::{DesiredUser, TeamManifest, TeamName};

use crate::error::DirectoryError;
use crate::DirectorySource;

/// Base URL for a bucket identifier.
///
/// A value containing `://` is taken as a base URL verbatim (trailing slash
/// stripped); a bare name becomes the S3 virtual-hosted form.
pub fn bucket_url(bucket: &str) -> String {
    if bucket.contains("://") {
        bucket.trim_end_matches('/').to_string()
    } else {
        format!("https://{bucket}.s3.amazonaws.com")
    }
}

/// Directory source reading `teams/<team>.json` objects over HTTP.
pub struct ManifestDirectory {
    agent: ureq::Agent,
    base_url: String,
}

impl ManifestDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.into(),
        }
    }

    fn object_url(&self, team: &TeamName) -> String {
        format!("{}/teams/{}.json", self.base_url, team.normalized())
    }
}

impl DirectorySource for ManifestDirectory {
    fn team_members(&self, team: &TeamName) -> Result<Vec<DesiredUser>, DirectoryError> {
        let url = self.object_url(team);
        log::debug!("fetching manifest: {url}");
        let body = match self.agent.get(&url).call() {
            Ok(response) => response.into_string()?,
            Err(ureq::Error::Status(404, _)) => {
                return Err(DirectoryError::TeamNotFound {
                    name: team.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let manifest: TeamManifest = serde_json::from_str(&body)?;
        Ok(manifest.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_bucket_becomes_s3_url() {
        assert_eq!(
            bucket_url("team-keys"),
            "https://team-keys.s3.amazonaws.com"
        );
    }

    #[test]
    fn full_url_is_used_verbatim() {
        assert_eq!(
            bucket_url("https://store.internal/keys/"),
            "https://store.internal/keys"
        );
    }

    #[test]
    fn object_url_uses_normalized_team_name() {
        let source = ManifestDirectory::new("https://store.internal");
        assert_eq!(
            source.object_url(&TeamName::from("Bar")),
            "https://store.internal/teams/bar.json"
        );
    }
}

//! Domain types for usersync.
//!
//! Logins and team names are newtypes; raw strings only appear at the
//! process boundary (environment, command output, manifest JSON).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The OS group whose membership this system treats as fully managed.
/// Any member of this group absent from the desired set is deleted.
pub const USERS_GROUP: &str = "users";

/// Supplementary group granted to every managed account (sudo-equivalent).
pub const SUDO_GROUP: &str = "wheel";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed OS account login. Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Login(pub String);

impl Login {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Login {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Login {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed directory team name.
///
/// Team names are matched case-insensitively against the source; use
/// [`TeamName::normalized`] before any comparison or lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamName(pub String);

impl TeamName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased copy used for comparisons and manifest object keys.
    pub fn normalized(&self) -> TeamName {
        TeamName(self.0.to_lowercase())
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TeamName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TeamName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Directory records
// ---------------------------------------------------------------------------

/// One user as the remote directory wants it to exist locally.
///
/// Produced fresh on every run; never persisted. `ssh_keys` holds raw
/// public-key lines in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredUser {
    pub login: Login,
    #[serde(default)]
    pub ssh_keys: Vec<String>,
}

/// On-the-wire shape of one manifest object (`teams/<team>.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamManifest {
    #[serde(default)]
    pub members: Vec<DesiredUser>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(Login::from("aad").to_string(), "aad");
        assert_eq!(TeamName::from("Platform").to_string(), "Platform");
    }

    #[test]
    fn team_name_normalized_lowercases() {
        assert_eq!(TeamName::from("Bar").normalized(), TeamName::from("bar"));
        assert_eq!(TeamName::from("foo").normalized(), TeamName::from("foo"));
    }

    #[test]
    fn login_equality_across_from_impls() {
        assert_eq!(Login::from("x"), Login::from(String::from("x")));
    }

    #[test]
    fn manifest_deserializes_member_records() {
        let json = r#"{
            "members": [
                {"login": "aad", "ssh_keys": ["ssh-rsa foo"]},
                {"login": "ddg", "ssh_keys": []}
            ]
        }"#;
        let manifest: TeamManifest = serde_json::from_str(json).expect("parse");
        assert_eq!(manifest.members.len(), 2);
        assert_eq!(manifest.members[0].login, Login::from("aad"));
        assert_eq!(manifest.members[0].ssh_keys, vec!["ssh-rsa foo"]);
        assert!(manifest.members[1].ssh_keys.is_empty());
    }

    #[test]
    fn manifest_tolerates_missing_fields() {
        let manifest: TeamManifest = serde_json::from_str("{}").expect("parse");
        assert!(manifest.members.is_empty());

        let manifest: TeamManifest =
            serde_json::from_str(r#"{"members": [{"login": "aad"}]}"#).expect("parse");
        assert!(manifest.members[0].ssh_keys.is_empty());
    }
}

//! GitHub-organization-backed directory source.
//!
//! Team membership comes from the org teams API; each member's public keys
//! come from the public user-keys endpoint. The org team list is fetched once
//! per run and cached, since every requested team filters the same list.

use std::cell::RefCell;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use usersync_core::types::{DesiredUser, Login, TeamName};

use crate::error::DirectoryError;
use crate::DirectorySource;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// API response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ApiTeam {
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct ApiMember {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiKey {
    key: String,
}

// ---------------------------------------------------------------------------
// GitHubDirectory
// ---------------------------------------------------------------------------

/// Directory source backed by a GitHub organization's teams.
pub struct GitHubDirectory {
    agent: ureq::Agent,
    api_base: String,
    token: String,
    org: String,
    teams: RefCell<Option<Vec<ApiTeam>>>,
}

impl GitHubDirectory {
    pub fn new(token: impl Into<String>, org: impl Into<String>) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, token, org)
    }

    /// Construct against a non-default API base URL (test servers, GHE).
    pub fn with_api_base(
        api_base: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
    ) -> Self {
        Self {
            agent: ureq::Agent::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            org: org.into(),
            teams: RefCell::new(None),
        }
    }

    fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: usize,
    ) -> Result<Vec<T>, DirectoryError> {
        let url = format!("{}{path}", self.api_base);
        let response = self
            .agent
            .get(&url)
            .query("per_page", &PAGE_SIZE.to_string())
            .query("page", &page.to_string())
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "usersync")
            .call()?;
        Ok(response.into_json()?)
    }

    /// Fetch every page of a list endpoint.
    fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, DirectoryError> {
        let mut all = Vec::new();
        for page in 1.. {
            let batch: Vec<T> = self.get_page(path, page)?;
            let len = batch.len();
            all.extend(batch);
            if len < PAGE_SIZE {
                break;
            }
        }
        Ok(all)
    }

    /// Slug of the org team whose name matches `team` case-insensitively.
    ///
    /// The org team list is fetched on first use and reused for the rest of
    /// the run.
    fn team_slug(&self, team: &TeamName) -> Result<Option<String>, DirectoryError> {
        if self.teams.borrow().is_none() {
            let teams: Vec<ApiTeam> = self.get_all(&format!("/orgs/{}/teams", self.org))?;
            log::debug!("fetched {} teams for org '{}'", teams.len(), self.org);
            *self.teams.borrow_mut() = Some(teams);
        }
        let teams = self.teams.borrow();
        let wanted = team.normalized();
        Ok(teams
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .find(|t| t.name.to_lowercase() == wanted.as_str())
            .map(|t| t.slug.clone()))
    }
}

impl DirectorySource for GitHubDirectory {
    fn team_members(&self, team: &TeamName) -> Result<Vec<DesiredUser>, DirectoryError> {
        let slug = self
            .team_slug(team)?
            .ok_or_else(|| DirectoryError::TeamNotFound {
                name: team.to_string(),
            })?;

        let members: Vec<ApiMember> =
            self.get_all(&format!("/orgs/{}/teams/{slug}/members", self.org))?;

        let mut desired = Vec::with_capacity(members.len());
        for member in members {
            let keys: Vec<ApiKey> = self.get_all(&format!("/users/{}/keys", member.login))?;
            desired.push(DesiredUser {
                login: Login::from(member.login),
                ssh_keys: keys.into_iter().map(|k| k.key).collect(),
            });
        }
        Ok(desired)
    }
}

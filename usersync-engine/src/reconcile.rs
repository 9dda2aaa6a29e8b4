//! Desired-state reconciliation.
//!
//! One pass: compute the desired user set from the directory source, ensure
//! every desired user exists locally with a current key file, then delete any
//! member of the managed `users` group the source no longer lists. Accounts
//! outside the managed group are never touched.
//!
//! Per-user and per-team failures are logged and counted, never propagated;
//! each scheduled run is its own retry unit.

use std::collections::{HashMap, HashSet};

use usersync_core::types::{DesiredUser, Login, TeamName, USERS_GROUP};
use usersync_directory::DirectorySource;
use usersync_os::AccountInventory;

use crate::error::SyncUserError;
use crate::keyfile::{KeyWriter, WriteOutcome};

// ---------------------------------------------------------------------------
// Sync report
// ---------------------------------------------------------------------------

/// Summary of one reconciliation pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Accounts created this run.
    pub created: Vec<Login>,
    /// Key-file outcome for every desired user that got that far.
    pub writes: Vec<WriteOutcome>,
    /// Managed accounts deleted this run.
    pub removed: Vec<Login>,
    /// Per-user or per-phase failures that were logged and skipped.
    pub failures: usize,
}

impl SyncReport {
    pub fn written(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, WriteOutcome::Written { .. }))
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, WriteOutcome::Unchanged { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Desired set
// ---------------------------------------------------------------------------

/// The full set of users the requested teams say should exist locally.
///
/// Team names are lowercased before lookup. A team the source cannot serve is
/// logged and skipped. A login appearing in several teams is deduplicated into
/// one record whose key list is the union across those teams, first-seen
/// order, duplicate key lines dropped.
pub fn compute_desired_users(
    source: &dyn DirectorySource,
    teams: &[TeamName],
) -> Vec<DesiredUser> {
    let mut order: Vec<Login> = Vec::new();
    let mut keys_by_login: HashMap<Login, Vec<String>> = HashMap::new();

    for team in teams {
        let team = team.normalized();
        let members = match source.team_members(&team) {
            Ok(members) => members,
            Err(e) => {
                tracing::error!("skipping team '{team}': {e}");
                continue;
            }
        };
        for member in members {
            let keys = keys_by_login.entry(member.login.clone()).or_insert_with(|| {
                order.push(member.login.clone());
                Vec::new()
            });
            for key in member.ssh_keys {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
    }

    order
        .into_iter()
        .map(|login| DesiredUser {
            ssh_keys: keys_by_login.remove(&login).unwrap_or_default(),
            login,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Run one full reconciliation pass.
///
/// Idempotent: a second run against an unchanged source creates nothing,
/// deletes nothing, and performs zero key-file writes.
pub fn sync(
    source: &dyn DirectorySource,
    inventory: &dyn AccountInventory,
    writer: &dyn KeyWriter,
    teams: &[TeamName],
) -> SyncReport {
    let desired = compute_desired_users(source, teams);
    let mut report = SyncReport::default();

    for user in &desired {
        if let Err(e) = ensure_user(inventory, writer, user, &mut report) {
            tracing::error!("failed to sync user '{}': {e}", user.login);
            report.failures += 1;
        }
    }

    let managed = match inventory.group_members(USERS_GROUP) {
        Ok(members) => members,
        Err(e) => {
            tracing::error!("cannot list '{USERS_GROUP}' members, skipping removal pass: {e}");
            report.failures += 1;
            return report;
        }
    };

    let desired_logins: HashSet<&str> = desired.iter().map(|u| u.login.as_str()).collect();
    let mut extras: Vec<String> = managed
        .into_iter()
        .filter(|login| !desired_logins.contains(login.as_str()))
        .collect();
    extras.sort();

    for login in extras {
        let login = Login::from(login);
        tracing::info!("removing user: {login}");
        match inventory.delete(&login) {
            Ok(()) => report.removed.push(login),
            Err(e) => {
                tracing::error!("failed to remove user '{login}': {e}");
                report.failures += 1;
            }
        }
    }

    report
}

fn ensure_user(
    inventory: &dyn AccountInventory,
    writer: &dyn KeyWriter,
    user: &DesiredUser,
    report: &mut SyncReport,
) -> Result<(), SyncUserError> {
    if !inventory.exists(&user.login)? {
        tracing::info!("adding user: {}", user.login);
        inventory.create(&user.login)?;
        report.created.push(user.login.clone());
    }
    let outcome = writer.ensure_keys(&user.login, &user.ssh_keys)?;
    report.writes.push(outcome);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

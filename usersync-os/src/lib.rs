//! # usersync-os
//!
//! Local account inventory: queries and mutates OS account state by invoking
//! the standard user-management utilities (`id`, `useradd`, `userdel`,
//! `getent`).
//!
//! The [`AccountInventory`] trait is the seam the reconciliation engine works
//! against; [`SystemAccounts`] is the real implementation. Tests elsewhere in
//! the workspace substitute in-memory fakes — nothing here can run without
//! root and a real account database.

pub mod error;

use std::collections::HashSet;
use std::process::{Command, Output};

use usersync_core::types::{Login, SUDO_GROUP, USERS_GROUP};

pub use error::AccountError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Queries and mutates the local OS account database.
pub trait AccountInventory {
    /// True iff an account with this login exists.
    ///
    /// "Not found" is a normal outcome mapped to `false`, never an error.
    fn exists(&self, login: &Login) -> Result<bool, AccountError>;

    /// Create an account with a home directory, primary group `users`, and
    /// supplementary group `wheel`. Callers check [`AccountInventory::exists`]
    /// first; the failure mode for an already-existing account is
    /// implementation-defined.
    fn create(&self, login: &Login) -> Result<(), AccountError>;

    /// Delete the account and forcibly remove its home directory tree.
    fn delete(&self, login: &Login) -> Result<(), AccountError>;

    /// Current member logins of the named OS group. A group with no members
    /// (or no such group) yields an empty set.
    fn group_members(&self, group: &str) -> Result<HashSet<String>, AccountError>;
}

/// The uid/gid pair applied to a user's key file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOwner {
    pub uid: u32,
    pub gid: u32,
}

/// Resolves the [`FileOwner`] for a login: the account's uid paired with the
/// gid of the managed `users` group.
pub trait OwnerResolver {
    fn owner(&self, login: &Login) -> Result<FileOwner, AccountError>;
}

// ---------------------------------------------------------------------------
// SystemAccounts
// ---------------------------------------------------------------------------

/// [`AccountInventory`] and [`OwnerResolver`] backed by the real system
/// utilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAccounts;

impl SystemAccounts {
    pub fn new() -> Self {
        Self
    }

    /// Raw group database line for `group`, or `None` if the group does not
    /// exist (`getent` exit code 2).
    fn group_entry(&self, group: &str) -> Result<Option<String>, AccountError> {
        let output = run("getent", &["group", group])?;
        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned())),
            Some(2) => Ok(None),
            _ => Err(command_failed("getent", &output)),
        }
    }
}

impl AccountInventory for SystemAccounts {
    fn exists(&self, login: &Login) -> Result<bool, AccountError> {
        let output = run("id", &[login.as_str()])?;
        // `id` exits 0 for a known user and 1 for an unknown one; both are
        // expected outcomes. Anything else is a real failure.
        match output.status.code() {
            Some(0) => Ok(String::from_utf8_lossy(&output.stdout).starts_with("uid")),
            Some(1) => Ok(false),
            _ => Err(command_failed("id", &output)),
        }
    }

    fn create(&self, login: &Login) -> Result<(), AccountError> {
        let supplementary = format!("{USERS_GROUP},{SUDO_GROUP}");
        let output = run(
            "useradd",
            &[
                "--create-home",
                "-g",
                USERS_GROUP,
                "-G",
                &supplementary,
                login.as_str(),
            ],
        )?;
        if !output.status.success() {
            return Err(command_failed("useradd", &output));
        }
        Ok(())
    }

    fn delete(&self, login: &Login) -> Result<(), AccountError> {
        let output = run("userdel", &["--remove", "--force", login.as_str()])?;
        if !output.status.success() {
            return Err(command_failed("userdel", &output));
        }
        Ok(())
    }

    fn group_members(&self, group: &str) -> Result<HashSet<String>, AccountError> {
        match self.group_entry(group)? {
            Some(line) => parse_group_members(&line),
            None => {
                log::warn!("group '{group}' not found; treating as empty");
                Ok(HashSet::new())
            }
        }
    }
}

impl OwnerResolver for SystemAccounts {
    fn owner(&self, login: &Login) -> Result<FileOwner, AccountError> {
        let output = run("id", &["-u", login.as_str()])?;
        if !output.status.success() {
            return Err(command_failed("id", &output));
        }
        let uid = parse_uid(&String::from_utf8_lossy(&output.stdout))?;

        let line = self
            .group_entry(USERS_GROUP)?
            .ok_or_else(|| AccountError::GroupNotFound {
                name: USERS_GROUP.to_string(),
            })?;
        let gid = parse_group_gid(&line)?;
        Ok(FileOwner { uid, gid })
    }
}

// ---------------------------------------------------------------------------
// Command plumbing and output parsing
// ---------------------------------------------------------------------------

fn run(program: &'static str, args: &[&str]) -> Result<Output, AccountError> {
    Command::new(program)
        .args(args)
        .output()
        .map_err(|source| AccountError::Spawn { program, source })
}

fn command_failed(program: &'static str, output: &Output) -> AccountError {
    AccountError::CommandFailed {
        program,
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn parse_uid(stdout: &str) -> Result<u32, AccountError> {
    stdout
        .trim()
        .parse()
        .map_err(|_| AccountError::Parse {
            program: "id",
            detail: format!("expected numeric uid, got {:?}", stdout.trim()),
        })
}

/// Member logins from a `getent group` line (`name:passwd:gid:a,b,c`).
fn parse_group_members(line: &str) -> Result<HashSet<String>, AccountError> {
    let members = group_field(line, 3)?;
    Ok(members
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Numeric gid from a `getent group` line.
fn parse_group_gid(line: &str) -> Result<u32, AccountError> {
    let field = group_field(line, 2)?;
    field.parse().map_err(|_| AccountError::Parse {
        program: "getent",
        detail: format!("expected numeric gid, got {field:?}"),
    })
}

fn group_field(line: &str, index: usize) -> Result<&str, AccountError> {
    line.trim_end()
        .split(':')
        .nth(index)
        .ok_or_else(|| AccountError::Parse {
            program: "getent",
            detail: format!("group line has no field {index}: {:?}", line.trim_end()),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

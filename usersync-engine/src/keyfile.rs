//! Change-gated atomic authorized_keys writer.
//!
//! ## `ensure_keys` — write protocol
//!
//! 1. Join the desired key lines with `\n`.
//! 2. Byte-compare against the current file → skip everything if identical.
//! 3. Create `<home>/<login>/.ssh/` if missing.
//! 4. Write to `authorized_keys.tmp`.
//! 5. chown the temp file to `<login>:users`, chmod it `0600`.
//! 6. Rename over the final path (atomic on POSIX).
//!
//! Ownership and mode land on the temp file *before* the rename, so the
//! final path is never observable with wrong owner or permissions.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use usersync_core::types::Login;
use usersync_os::{FileOwner, OwnerResolver};

use crate::error::{io_err, KeyFileError};

// ---------------------------------------------------------------------------
// Write outcome
// ---------------------------------------------------------------------------

/// Outcome of an individual key-file sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped — on-disk content already matches the desired keys.
    Unchanged { path: PathBuf },
}

// ---------------------------------------------------------------------------
// KeyWriter
// ---------------------------------------------------------------------------

/// Keeps a user's authorized-keys file equal to their desired key set.
pub trait KeyWriter {
    fn ensure_keys(&self, login: &Login, keys: &[String]) -> Result<WriteOutcome, KeyFileError>;
}

/// [`KeyWriter`] writing `<home_root>/<login>/.ssh/authorized_keys`.
pub struct AuthorizedKeysWriter<R> {
    home_root: PathBuf,
    owners: R,
}

impl<R: OwnerResolver> AuthorizedKeysWriter<R> {
    /// Writer rooted at the real `/home`.
    pub fn new(owners: R) -> Self {
        Self::rooted("/home", owners)
    }

    /// Writer rooted at an explicit directory; used in tests with `TempDir`.
    pub fn rooted(home_root: impl Into<PathBuf>, owners: R) -> Self {
        Self {
            home_root: home_root.into(),
            owners,
        }
    }

    fn key_file_path(&self, login: &Login) -> PathBuf {
        self.home_root
            .join(login.as_str())
            .join(".ssh")
            .join("authorized_keys")
    }
}

impl<R: OwnerResolver> KeyWriter for AuthorizedKeysWriter<R> {
    fn ensure_keys(&self, login: &Login, keys: &[String]) -> Result<WriteOutcome, KeyFileError> {
        let desired = keys.join("\n");
        let path = self.key_file_path(login);

        if !has_changed(&path, desired.as_bytes())? {
            tracing::debug!("keys unchanged for user: {login}");
            return Ok(WriteOutcome::Unchanged { path });
        }

        let owner = self
            .owners
            .owner(login)
            .map_err(|source| KeyFileError::Owner {
                login: login.clone(),
                source,
            })?;

        let Some(ssh_dir) = path.parent() else {
            return Err(io_err(&path, std::io::Error::other("key file has no parent")));
        };
        std::fs::create_dir_all(ssh_dir).map_err(|e| io_err(ssh_dir, e))?;

        let tmp = PathBuf::from(format!("{}.tmp", path.display()));
        std::fs::write(&tmp, &desired).map_err(|e| io_err(&tmp, e))?;
        set_owner(&tmp, owner).map_err(|e| io_err(&tmp, e))?;
        set_mode_0600(&tmp).map_err(|e| io_err(&tmp, e))?;

        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }

        tracing::info!("wrote {} key(s) for user: {login}", keys.len());
        Ok(WriteOutcome::Written { path })
    }
}

/// True iff the file is absent or its bytes differ from `desired`.
fn has_changed(path: &Path, desired: &[u8]) -> Result<bool, KeyFileError> {
    match std::fs::read(path) {
        Ok(current) => Ok(current != desired),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
        Err(e) => Err(io_err(path, e)),
    }
}

#[cfg(unix)]
fn set_owner(path: &Path, owner: FileOwner) -> std::io::Result<()> {
    std::os::unix::fs::chown(path, Some(owner.uid), Some(owner.gid))
}
#[cfg(not(unix))]
fn set_owner(_path: &Path, _owner: FileOwner) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_mode_0600(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}
#[cfg(not(unix))]
fn set_mode_0600(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

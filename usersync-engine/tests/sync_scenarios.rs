//! End-to-end reconciliation scenarios against an in-memory account
//! inventory and a real key-file writer rooted in a tempdir.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use usersync_core::types::{DesiredUser, Login, TeamName};
use usersync_directory::{DirectoryError, DirectorySource};
use usersync_engine::{sync, AuthorizedKeysWriter, KeyWriter, WriteOutcome};
use usersync_os::{AccountError, AccountInventory, FileOwner, OwnerResolver};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct StaticSource {
    teams: HashMap<String, Vec<DesiredUser>>,
}

impl StaticSource {
    fn new(teams: &[(&str, &[(&str, &[&str])])]) -> Self {
        let teams = teams
            .iter()
            .map(|(name, members)| {
                let members = members
                    .iter()
                    .map(|(login, keys)| DesiredUser {
                        login: Login::from(*login),
                        ssh_keys: keys.iter().map(|k| k.to_string()).collect(),
                    })
                    .collect();
                (name.to_string(), members)
            })
            .collect();
        Self { teams }
    }
}

impl DirectorySource for StaticSource {
    fn team_members(&self, team: &TeamName) -> Result<Vec<DesiredUser>, DirectoryError> {
        self.teams
            .get(team.as_str())
            .cloned()
            .ok_or_else(|| DirectoryError::TeamNotFound {
                name: team.to_string(),
            })
    }
}

/// In-memory account database mirroring the pieces of OS behavior the
/// reconciler depends on: `useradd --create-home` materializes a home
/// directory, `userdel --remove` tears it down.
struct FakeInventory {
    home_root: PathBuf,
    accounts: RefCell<HashSet<String>>,
    users_group: RefCell<HashSet<String>>,
    wheel_group: RefCell<HashSet<String>>,
    fail_create: HashSet<String>,
}

impl FakeInventory {
    fn new(home_root: &Path) -> Self {
        Self {
            home_root: home_root.to_path_buf(),
            accounts: RefCell::new(HashSet::new()),
            users_group: RefCell::new(HashSet::new()),
            wheel_group: RefCell::new(HashSet::new()),
            fail_create: HashSet::new(),
        }
    }

    /// Seed a pre-existing account. Managed accounts are members of `users`
    /// and `wheel`; unmanaged ones are in neither.
    fn seed_account(&self, login: &str, managed: bool) {
        self.accounts.borrow_mut().insert(login.to_string());
        if managed {
            self.users_group.borrow_mut().insert(login.to_string());
            self.wheel_group.borrow_mut().insert(login.to_string());
        }
        std::fs::create_dir_all(self.home_root.join(login)).expect("seed home");
    }

    fn failing_create(mut self, login: &str) -> Self {
        self.fail_create.insert(login.to_string());
        self
    }

    fn has_account(&self, login: &str) -> bool {
        self.accounts.borrow().contains(login)
    }
}

impl AccountInventory for FakeInventory {
    fn exists(&self, login: &Login) -> Result<bool, AccountError> {
        Ok(self.accounts.borrow().contains(login.as_str()))
    }

    fn create(&self, login: &Login) -> Result<(), AccountError> {
        if self.fail_create.contains(login.as_str()) {
            return Err(AccountError::Spawn {
                program: "useradd",
                source: std::io::Error::other("simulated useradd failure"),
            });
        }
        self.accounts.borrow_mut().insert(login.to_string());
        self.users_group.borrow_mut().insert(login.to_string());
        self.wheel_group.borrow_mut().insert(login.to_string());
        std::fs::create_dir_all(self.home_root.join(login.as_str()))
            .map_err(|source| AccountError::Spawn {
                program: "useradd",
                source,
            })
    }

    fn delete(&self, login: &Login) -> Result<(), AccountError> {
        self.accounts.borrow_mut().remove(login.as_str());
        self.users_group.borrow_mut().remove(login.as_str());
        self.wheel_group.borrow_mut().remove(login.as_str());
        let home = self.home_root.join(login.as_str());
        if home.exists() {
            std::fs::remove_dir_all(&home).map_err(|source| AccountError::Spawn {
                program: "userdel",
                source,
            })?;
        }
        Ok(())
    }

    fn group_members(&self, group: &str) -> Result<HashSet<String>, AccountError> {
        match group {
            "users" => Ok(self.users_group.borrow().clone()),
            "wheel" => Ok(self.wheel_group.borrow().clone()),
            _ => Ok(HashSet::new()),
        }
    }
}

/// Resolves every login to the test process's own uid/gid so chown succeeds
/// unprivileged.
struct SelfOwner {
    owner: FileOwner,
}

impl SelfOwner {
    fn for_dir(dir: &Path) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let meta = std::fs::metadata(dir).expect("metadata");
            Self {
                owner: FileOwner {
                    uid: meta.uid(),
                    gid: meta.gid(),
                },
            }
        }
        #[cfg(not(unix))]
        {
            let _ = dir;
            Self {
                owner: FileOwner { uid: 0, gid: 0 },
            }
        }
    }
}

impl OwnerResolver for SelfOwner {
    fn owner(&self, _login: &Login) -> Result<FileOwner, AccountError> {
        Ok(self.owner)
    }
}

struct Fixture {
    home: TempDir,
    inventory: FakeInventory,
}

impl Fixture {
    fn new() -> Self {
        let home = TempDir::new().expect("home");
        let inventory = FakeInventory::new(home.path());
        Self { home, inventory }
    }

    fn writer(&self) -> AuthorizedKeysWriter<SelfOwner> {
        AuthorizedKeysWriter::rooted(self.home.path(), SelfOwner::for_dir(self.home.path()))
    }

    fn key_file(&self, login: &str) -> PathBuf {
        self.home.path().join(login).join(".ssh/authorized_keys")
    }
}

fn teams(names: &[&str]) -> Vec<TeamName> {
    names.iter().map(|n| TeamName::from(*n)).collect()
}

fn two_team_source() -> StaticSource {
    StaticSource::new(&[
        ("foo", &[("aad", &["k1"]), ("bbe", &["k2", "k3"])]),
        ("bar", &[("ccf", &["k4"])]),
    ])
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn creates_all_desired_users_with_groups_and_keys() {
    let fx = Fixture::new();
    let source = two_team_source();

    let report = sync(&source, &fx.inventory, &fx.writer(), &teams(&["foo", "Bar"]));

    assert_eq!(report.created.len(), 3);
    assert_eq!(report.failures, 0);
    for login in ["aad", "bbe", "ccf"] {
        assert!(fx.inventory.has_account(login));
        assert!(fx.inventory.group_members("users").unwrap().contains(login));
        assert!(fx.inventory.group_members("wheel").unwrap().contains(login));
    }
    assert_eq!(
        std::fs::read_to_string(fx.key_file("aad")).unwrap(),
        "k1"
    );
    assert_eq!(
        std::fs::read_to_string(fx.key_file("bbe")).unwrap(),
        "k2\nk3"
    );
    assert_eq!(
        std::fs::read_to_string(fx.key_file("ccf")).unwrap(),
        "k4"
    );
}

#[test]
fn second_run_is_a_full_noop() {
    let fx = Fixture::new();
    let source = two_team_source();
    let team_names = teams(&["foo", "bar"]);

    sync(&source, &fx.inventory, &fx.writer(), &team_names);
    let second = sync(&source, &fx.inventory, &fx.writer(), &team_names);

    assert!(second.created.is_empty());
    assert!(second.removed.is_empty());
    assert_eq!(second.written(), 0, "second run must perform zero writes");
    assert_eq!(second.unchanged(), 3);
    assert_eq!(second.failures, 0);
}

#[test]
fn managed_account_absent_from_source_is_removed_with_home() {
    let fx = Fixture::new();
    fx.inventory.seed_account("stale", true);
    let source = two_team_source();

    let report = sync(&source, &fx.inventory, &fx.writer(), &teams(&["foo", "bar"]));

    assert_eq!(report.removed, vec![Login::from("stale")]);
    assert!(!fx.inventory.has_account("stale"));
    assert!(!fx.home.path().join("stale").exists(), "home must be removed");
}

#[test]
fn unmanaged_account_is_never_touched() {
    let fx = Fixture::new();
    fx.inventory.seed_account("root", false);
    let source = two_team_source();

    let report = sync(&source, &fx.inventory, &fx.writer(), &teams(&["foo", "bar"]));

    assert!(report.removed.is_empty());
    assert!(fx.inventory.has_account("root"));
    assert!(fx.home.path().join("root").exists());
}

#[test]
fn user_with_no_keys_gets_empty_key_file() {
    let fx = Fixture::new();
    let source = StaticSource::new(&[("foo", &[("ddg", &[])])]);

    let report = sync(&source, &fx.inventory, &fx.writer(), &teams(&["foo"]));

    assert_eq!(report.failures, 0);
    let content = std::fs::read_to_string(fx.key_file("ddg")).unwrap();
    assert_eq!(content, "");
}

#[test]
fn missing_team_does_not_abort_the_run() {
    let fx = Fixture::new();
    let source = two_team_source();

    let report = sync(
        &source,
        &fx.inventory,
        &fx.writer(),
        &teams(&["foo", "ghost", "bar"]),
    );

    assert_eq!(report.created.len(), 3);
    assert!(fx.inventory.has_account("aad"));
    assert!(fx.inventory.has_account("ccf"));
}

#[test]
fn one_failing_create_does_not_block_other_users() {
    let home = TempDir::new().expect("home");
    let inventory = FakeInventory::new(home.path()).failing_create("bbe");
    let writer =
        AuthorizedKeysWriter::rooted(home.path(), SelfOwner::for_dir(home.path()));
    let source = two_team_source();

    let report = sync(&source, &inventory, &writer, &teams(&["foo", "bar"]));

    assert_eq!(report.failures, 1);
    assert!(inventory.has_account("aad"));
    assert!(inventory.has_account("ccf"));
    assert!(!inventory.has_account("bbe"));
    // The accounts that did sync still got their key files.
    assert_eq!(
        std::fs::read_to_string(home.path().join("aad/.ssh/authorized_keys")).unwrap(),
        "k1"
    );
}

#[test]
fn one_failing_key_write_does_not_block_other_users() {
    struct FailFor<'a, W> {
        login: &'a str,
        inner: W,
    }

    impl<W: KeyWriter> KeyWriter for FailFor<'_, W> {
        fn ensure_keys(
            &self,
            login: &Login,
            keys: &[String],
        ) -> Result<WriteOutcome, usersync_engine::KeyFileError> {
            if login.as_str() == self.login {
                return Err(usersync_engine::KeyFileError::Io {
                    path: PathBuf::from("/home/bbe/.ssh/authorized_keys"),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.ensure_keys(login, keys)
        }
    }

    let fx = Fixture::new();
    let writer = FailFor {
        login: "bbe",
        inner: fx.writer(),
    };
    let source = two_team_source();

    let report = sync(&source, &fx.inventory, &writer, &teams(&["foo", "bar"]));

    assert_eq!(report.failures, 1);
    // The account itself was still created; only its key sync failed.
    assert!(fx.inventory.has_account("bbe"));
    assert_eq!(report.writes.len(), 2);
    assert!(fx.key_file("aad").exists());
    assert!(fx.key_file("ccf").exists());
}

#[test]
fn key_change_in_source_rewrites_only_that_file() {
    let fx = Fixture::new();
    let team_names = teams(&["foo", "bar"]);

    sync(&two_team_source(), &fx.inventory, &fx.writer(), &team_names);

    let rotated = StaticSource::new(&[
        ("foo", &[("aad", &["k1-rotated"]), ("bbe", &["k2", "k3"])]),
        ("bar", &[("ccf", &["k4"])]),
    ]);
    let report = sync(&rotated, &fx.inventory, &fx.writer(), &team_names);

    assert_eq!(report.written(), 1);
    assert_eq!(report.unchanged(), 2);
    assert_eq!(
        std::fs::read_to_string(fx.key_file("aad")).unwrap(),
        "k1-rotated"
    );
}

//! usersync — reconcile local OS accounts and SSH keys against a remote
//! directory.
//!
//! # Usage
//!
//! ```text
//! TEAM_NAMES=platform,ops DIRECTORY_TOKEN=... DIRECTORY_ORG=acme usersync
//! TEAM_NAMES=platform,ops MANIFEST_BUCKET=team-keys usersync
//! ```
//!
//! Single-shot: computes the full desired state, applies the minimal set of
//! changes, prints a summary, and exits. Designed to run from a scheduler;
//! each invocation is its own retry unit. Exit code is non-zero only for a
//! configuration error.

mod logger;

use anyhow::{Context, Result};
use clap::Parser;

use usersync_core::{Config, SourceConfig};
use usersync_directory::{bucket_url, DirectorySource, GitHubDirectory, ManifestDirectory};
use usersync_engine::{reconcile, AuthorizedKeysWriter, SyncReport, WriteOutcome};
use usersync_os::SystemAccounts;

#[derive(Parser, Debug)]
#[command(
    name = "usersync",
    version,
    about = "Sync local user accounts and SSH authorized keys from a remote directory",
    long_about = None,
)]
struct Cli {}

fn main() -> Result<()> {
    let _cli = Cli::parse();
    logger::init().context("failed to install logger")?;

    let config = Config::from_env().context("invalid configuration")?;

    let source: Box<dyn DirectorySource> = match &config.source {
        SourceConfig::GitHub { token, org } => {
            Box::new(GitHubDirectory::new(token.clone(), org.clone()))
        }
        SourceConfig::Manifest { bucket } => Box::new(ManifestDirectory::new(bucket_url(bucket))),
    };

    let accounts = SystemAccounts::new();
    let writer = AuthorizedKeysWriter::new(accounts);

    let report = reconcile::sync(source.as_ref(), &accounts, &writer, &config.teams);
    print_report(&report);

    Ok(())
}

fn print_report(report: &SyncReport) {
    println!(
        "✓ sync complete ({} created, {} written, {} unchanged, {} removed, {} failures)",
        report.created.len(),
        report.written(),
        report.unchanged(),
        report.removed.len(),
        report.failures,
    );
    for write in &report.writes {
        match write {
            WriteOutcome::Written { path } => println!("  ✎  {}", path.display()),
            WriteOutcome::Unchanged { path } => println!("  ·  {}", path.display()),
        }
    }
    for login in &report.removed {
        println!("  ✗  {login}");
    }
}

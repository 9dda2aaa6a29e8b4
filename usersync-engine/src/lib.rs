//! # usersync-engine
//!
//! Change-gated atomic key-file writer and account reconciliation.
//!
//! Call [`reconcile::sync`] to drive one full reconciliation pass: compute
//! the desired user set from a directory source, create missing accounts and
//! refresh key files, then delete managed accounts the source no longer
//! knows about.

pub mod error;
pub mod keyfile;
pub mod reconcile;

pub use error::{KeyFileError, SyncUserError};
pub use keyfile::{AuthorizedKeysWriter, KeyWriter, WriteOutcome};
pub use reconcile::{compute_desired_users, sync, SyncReport};

//! # usersync-core
//!
//! Domain types and environment configuration for the usersync workspace.
//!
//! The reconciliation engine, the directory source adapters, and the account
//! inventory all speak in terms of the types defined here: [`types::Login`],
//! [`types::TeamName`], and [`types::DesiredUser`].

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, SourceConfig};
pub use error::ConfigError;
pub use types::{DesiredUser, Login, TeamManifest, TeamName, SUDO_GROUP, USERS_GROUP};

//! `factordesk-app`: configuration and wiring for the back office.
//!
//! Builds the local storage, session store, draft store and remote
//! collaborators from an [`AppConfig`] and exposes them as one [`Backoffice`].

pub mod backoffice;
pub mod config;

pub use backoffice::{Backoffice, TableFactory, fixed_table};
pub use config::{AppConfig, ConfigError, RemoteConfig};

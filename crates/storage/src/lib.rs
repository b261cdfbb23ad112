//! `factordesk-storage`
//!
//! **Responsibility:** durable, string-valued local key/value storage.
//!
//! This is the only place the back office writes to disk. Everything above it
//! (session flags, the invoice-draft blob) talks to the [`LocalStorage`] trait
//! so tests can swap in [`MemoryStorage`].

pub mod memory;
pub mod sqlite;

use thiserror::Error;

pub use memory::MemoryStorage;
pub use sqlite::{SqliteStorage, default_db_path};

/// Simple get/set/remove storage keyed by string.
///
/// Implementations are synchronous; callers treat writes as fire-and-forget
/// and log failures instead of propagating them to the user.
pub trait LocalStorage: Send + Sync + core::fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend failed: {0:#}")]
    Backend(#[from] anyhow::Error),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("storage is closed")]
    Closed,
}

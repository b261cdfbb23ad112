//! SQLite-backed durable storage.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::runtime::{Builder, Handle, Runtime};

use crate::{LocalStorage, StorageError};

/// Durable [`LocalStorage`] kept in a single SQLite file.
///
/// The public API is synchronous. Each call drives the async `sqlx` pool on a
/// private current-thread runtime. Calls made from inside another runtime run
/// on a short-lived helper thread instead of nesting `block_on`.
#[derive(Debug)]
pub struct SqliteStorage {
    /// Only `None` while dropping.
    runtime: Option<Runtime>,
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteStorage {
    /// Open (creating if needed) the storage file at `path`.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create storage directory at {:?}", parent))?;
        }

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to create runtime for local storage")?;

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);

        let pool = drive(&runtime, async {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options)
                .await
                .with_context(|| format!("failed to open SQLite storage at {:?}", path))?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS local_storage (
                    key        TEXT PRIMARY KEY NOT NULL,
                    value      TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&pool)
            .await
            .context("failed to create local_storage table")?;

            Ok::<_, anyhow::Error>(pool)
        })??;

        tracing::debug!(path = %path.display(), "local storage opened");

        Ok(Self {
            runtime: Some(runtime),
            pool,
            path,
        })
    }

    /// Open the storage file at the platform default location.
    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(default_db_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn block_on<F>(&self, fut: F) -> Result<F::Output, StorageError>
    where
        F: Future + Send,
        F::Output: Send,
    {
        let runtime = self.runtime.as_ref().ok_or(StorageError::Closed)?;
        Ok(drive(runtime, fut)?)
    }
}

impl Drop for SqliteStorage {
    fn drop(&mut self) {
        // A blocking shutdown panics when dropped inside another runtime.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Run `fut` to completion on `runtime`, from any calling context.
fn drive<F>(runtime: &Runtime, fut: F) -> anyhow::Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    if Handle::try_current().is_err() {
        return Ok(runtime.block_on(fut));
    }
    std::thread::scope(|scope| scope.spawn(|| runtime.block_on(fut)).join())
        .map_err(|_| anyhow::anyhow!("local storage worker thread panicked"))
}

impl LocalStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = self
            .block_on(async {
                sqlx::query(
                    r#"
                    SELECT value
                    FROM local_storage
                    WHERE key = ?1
                    "#,
                )
                .bind(key)
                .fetch_optional(&self.pool)
                .await
            })?
            .with_context(|| format!("failed to read key {key:?} from local storage"))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let value: String = row
            .try_get("value")
            .context("malformed local_storage row")?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();

        self.block_on(async {
                sqlx::query(
                    r#"
                    INSERT INTO local_storage (key, value, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(key)
                    DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(key)
                .bind(value)
                .bind(&now)
                .execute(&self.pool)
                .await
            })?
            .with_context(|| format!("failed to write key {key:?} to local storage"))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.block_on(async {
                sqlx::query(
                    r#"
                    DELETE FROM local_storage
                    WHERE key = ?1
                    "#,
                )
                .bind(key)
                .execute(&self.pool)
                .await
            })?
            .with_context(|| format!("failed to remove key {key:?} from local storage"))?;

        Ok(())
    }
}

/// Resolve the default storage file: `{app_data_dir}/factordesk/local.db`.
pub fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut path = base;
    path.push("factordesk");
    path.push("local.db");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.db");

        {
            let storage = SqliteStorage::open(&path).unwrap();
            storage.set("invoiceDrafts", r#"{"version":1,"drafts":[]}"#).unwrap();
            storage.set("userEmail", "first@example.com").unwrap();
            storage.set("userEmail", "second@example.com").unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(
            storage.get("userEmail").unwrap().as_deref(),
            Some("second@example.com")
        );
        assert_eq!(
            storage.get("invoiceDrafts").unwrap().as_deref(),
            Some(r#"{"version":1,"drafts":[]}"#)
        );
    }

    #[test]
    fn missing_and_removed_keys_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(dir.path().join("local.db")).unwrap();

        assert!(storage.get("session").unwrap().is_none());

        storage.set("session", "{}").unwrap();
        storage.remove("session").unwrap();
        storage.remove("session").unwrap();
        assert!(storage.get("session").unwrap().is_none());
    }

    #[tokio::test]
    async fn usable_from_inside_an_async_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(dir.path().join("local.db")).unwrap();

        storage.set("isAuthenticated", "true").unwrap();
        assert_eq!(
            storage.get("isAuthenticated").unwrap().as_deref(),
            Some("true")
        );
        drop(storage);
    }

    #[test]
    fn default_path_ends_in_app_folder() {
        if let Ok(path) = default_db_path() {
            assert!(path.ends_with("factordesk/local.db"));
        }
    }
}

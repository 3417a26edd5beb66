//! The durable key-value store backing session persistence.
//!
//! `Store` wraps a SQLite database with a single `kv` table. Reads and writes go through the
//! silent `get`/`set` boundary: out-of-range keys and values are skipped, and SQL failures are
//! logged and degraded to "not found" / "write failed" rather than surfaced to the caller. Only
//! `open` can fail.

mod migrations;

use crate::Result;
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error};

/// The schema version that this build of the application requires.
const SCHEMA_VERSION: i32 = 1;

/// Longest accepted key, in characters, measured before trimming.
const MAX_KEY_CHARS: usize = 100;

/// Longest accepted value, in characters, measured before trimming.
const MAX_VALUE_CHARS: usize = 10_000;

/// A handle to the key-value database. Cheap to clone.
#[derive(Debug, Clone)]
pub(crate) struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens the database at `path`, creating the file if it does not exist, and brings the
    /// schema up to the current version.
    pub(crate) async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .context("Failed to parse SQLite connection string")?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open the SQLite database at {}", path.display()))?;

        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;

        let row: (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .context("Failed to query schema version")?;

        let current = match row.0 {
            Some(version) => version,
            None => {
                sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
                    .execute(&pool)
                    .await
                    .context("Failed to insert initial schema version")?;
                0
            }
        };

        migrations::run(&pool, current, SCHEMA_VERSION).await?;

        Ok(Self { pool })
    }

    /// Returns the stored value for `key`, or `None` when the key is missing, out of range, or
    /// the read fails. Failures are logged, never propagated.
    pub(crate) async fn get(&self, key: &str) -> Option<String> {
        if key.trim().is_empty() || key.chars().count() > MAX_KEY_CHARS {
            debug!("Skipping read for an empty or oversized key");
            return None;
        }
        match self.try_get(key.trim()).await {
            Ok(value) => value,
            Err(e) => {
                error!("Storage error: {e:#}");
                None
            }
        }
    }

    /// Stores `value` under `key`, trimming both. Out-of-range keys and values are skipped and
    /// write failures are logged; neither reaches the caller.
    pub(crate) async fn set(&self, key: &str, value: &str) {
        if key.trim().is_empty() || key.chars().count() > MAX_KEY_CHARS {
            debug!("Skipping write for an empty or oversized key");
            return;
        }
        if value.trim().is_empty() || value.chars().count() > MAX_VALUE_CHARS {
            debug!("Skipping write of an empty or oversized value for key '{}'", key.trim());
            return;
        }
        if let Err(e) = self.try_set(key.trim(), value.trim()).await {
            error!("Storage error: {e:#}");
        }
    }

    async fn try_get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read key '{key}'"))?;
        Ok(row.map(|(value,)| value))
    }

    async fn try_set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write key '{key}'"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.sqlite")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (_dir, store) = open_store().await;
        store.set("sessions", "[]").await;
        assert_eq!(store.get("sessions").await, Some("[]".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let (_dir, store) = open_store().await;
        assert_eq!(store.get("sessions").await, None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (_dir, store) = open_store().await;
        store.set("k", "one").await;
        store.set("k", "two").await;
        assert_eq!(store.get("k").await, Some("two".to_string()));
    }

    #[tokio::test]
    async fn test_values_are_trimmed() {
        let (_dir, store) = open_store().await;
        store.set("  k  ", "  v  ").await;
        assert_eq!(store.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_oversized_key_is_skipped() {
        let (_dir, store) = open_store().await;
        let key = "k".repeat(MAX_KEY_CHARS + 1);
        store.set(&key, "v").await;
        assert_eq!(store.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_oversized_value_is_skipped() {
        let (_dir, store) = open_store().await;
        store.set("k", &"v".repeat(MAX_VALUE_CHARS + 1)).await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn test_blank_key_and_value_are_skipped() {
        let (_dir, store) = open_store().await;
        store.set("   ", "v").await;
        store.set("k", "   ").await;
        assert_eq!(store.get("k").await, None);
        assert_eq!(store.get("   ").await, None);
    }

    #[tokio::test]
    async fn test_limit_boundaries_are_accepted() {
        let (_dir, store) = open_store().await;
        let key = "k".repeat(MAX_KEY_CHARS);
        let value = "v".repeat(MAX_VALUE_CHARS);
        store.set(&key, &value).await;
        assert_eq!(store.get(&key).await, Some(value));
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        {
            let store = Store::open(&path).await.unwrap();
            store.set("k", "v").await;
        }
        let store = Store::open(&path).await.unwrap();
        assert_eq!(store.get("k").await, Some("v".to_string()));
    }
}

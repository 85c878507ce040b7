//! Snapshot storage backends: SQLite and a no-op for disabled caching.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::traits::{CachedSnapshot, SnapshotCache};
use crate::error::CacheError;

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl SnapshotCache for NoopStorage {
  fn store_snapshot<T: Serialize>(&self, _slot: &str, _items: &[T]) -> Result<(), CacheError> {
    Ok(()) // Discard
  }

  fn load_snapshot<T: DeserializeOwned>(
    &self,
    _slot: &str,
  ) -> Result<Option<CachedSnapshot<T>>, CacheError> {
    Ok(None) // Always miss
  }
}

/// SQLite-based snapshot storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self, CacheError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    debug!(path = %path.display(), "opened snapshot cache");
    Self::with_connection(conn)
  }

  /// Open the cache database at the default location.
  pub fn open_default() -> Result<Self, CacheError> {
    Self::open(&Self::default_path()?)
  }

  /// In-memory database, gone when dropped.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, CacheError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, CacheError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(CacheError::NoDataDir)?;

    Ok(data_dir.join("bookstall").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> Result<Self, CacheError> {
    conn.execute_batch(CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }
}

/// Schema for the snapshot table.
const CACHE_SCHEMA: &str = r#"
-- One serialized snapshot per slot
CREATE TABLE IF NOT EXISTS snapshot_cache (
    slot TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    item_count INTEGER NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SnapshotCache for SqliteStorage {
  fn store_snapshot<T: Serialize>(&self, slot: &str, items: &[T]) -> Result<(), CacheError> {
    let data = serde_json::to_vec(items)?;
    let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;

    conn.execute(
      "INSERT OR REPLACE INTO snapshot_cache (slot, data, item_count, cached_at)
       VALUES (?, ?, ?, datetime('now'))",
      params![slot, data, items.len()],
    )?;

    Ok(())
  }

  fn load_snapshot<T: DeserializeOwned>(
    &self,
    slot: &str,
  ) -> Result<Option<CachedSnapshot<T>>, CacheError> {
    let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT data, cached_at FROM snapshot_cache WHERE slot = ?",
        params![slot],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    match row {
      Some((data, cached_at_str)) => {
        let items: Vec<T> = serde_json::from_slice(&data)?;
        let cached_at = parse_datetime(&cached_at_str)?;
        Ok(Some(CachedSnapshot { items, cached_at }))
      }
      None => Ok(None),
    }
  }
}

/// Storage selected at startup from configuration.
pub enum CacheBackend {
  Sqlite(SqliteStorage),
  Disabled(NoopStorage),
}

impl SnapshotCache for CacheBackend {
  fn store_snapshot<T: Serialize>(&self, slot: &str, items: &[T]) -> Result<(), CacheError> {
    match self {
      CacheBackend::Sqlite(s) => s.store_snapshot(slot, items),
      CacheBackend::Disabled(s) => s.store_snapshot(slot, items),
    }
  }

  fn load_snapshot<T: DeserializeOwned>(
    &self,
    slot: &str,
  ) -> Result<Option<CachedSnapshot<T>>, CacheError> {
    match self {
      CacheBackend::Sqlite(s) => s.load_snapshot(slot),
      CacheBackend::Disabled(s) => s.load_snapshot(slot),
    }
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|_| CacheError::Timestamp(s.to_string()))
}

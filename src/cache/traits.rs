//! Core traits and types for snapshot caching.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CacheError;

/// A persisted snapshot together with the time it was written.
#[derive(Debug, Clone)]
pub struct CachedSnapshot<T> {
  /// The cached items in their original order
  pub items: Vec<T>,
  /// When the snapshot was cached
  pub cached_at: DateTime<Utc>,
}

/// Trait for snapshot storage backends.
///
/// A backend holds named slots, each containing the last snapshot written to it.
/// Writes overwrite the slot wholesale.
pub trait SnapshotCache: Send + Sync {
  /// Replace the contents of `slot` with `items`.
  fn store_snapshot<T: Serialize>(&self, slot: &str, items: &[T]) -> Result<(), CacheError>;

  /// Read back the snapshot in `slot`, if one was ever written.
  fn load_snapshot<T: DeserializeOwned>(
    &self,
    slot: &str,
  ) -> Result<Option<CachedSnapshot<T>>, CacheError>;
}

/// Snapshot handed back by [`CacheLayer::fetch_snapshot`](super::CacheLayer::fetch_snapshot).
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// Set only when `data` was read back from the cache
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    CacheResult {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Served from the slot after the fetch failed.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    CacheResult {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
    }
  }
}

/// Which side of the cache layer produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Live fetch
  Network,
  /// Network failed, serving the last cached snapshot
  Offline,
}

//! Cache layer that puts a persisted snapshot behind a network fetch.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::traits::{CacheResult, SnapshotCache};

/// Cache layer that manages write-through and offline fallback.
///
/// The network is always tried first. The cache is only written after a
/// successful fetch, and only read when a fetch fails.
pub struct CacheLayer<S: SnapshotCache> {
  storage: Arc<S>,
}

impl<S: SnapshotCache> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Fetch a full snapshot with network-first strategy.
  ///
  /// 1. Fetch from network
  /// 2. On success, overwrite `slot` with the result if `still_wanted()` holds
  ///    (write failures are logged only)
  /// 3. On failure, serve the cached snapshot in `slot` (offline mode)
  /// 4. With nothing cached, hand back the fetch error
  pub async fn fetch_snapshot<T, E, F, Fut, W>(
    &self,
    slot: &str,
    fetcher: F,
    still_wanted: W,
  ) -> Result<CacheResult<Vec<T>>, E>
  where
    T: Serialize + DeserializeOwned,
    E: std::fmt::Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
    W: FnOnce() -> bool,
  {
    match fetcher().await {
      Ok(data) => {
        if !still_wanted() {
          debug!(slot, "fetch superseded, skipping cache write");
        } else if let Err(e) = self.storage.store_snapshot(slot, &data) {
          warn!(slot, error = %e, "failed to write snapshot cache");
        }
        Ok(CacheResult::from_network(data))
      }
      Err(fetch_err) => {
        error!(slot, error = %fetch_err, "fetch failed, trying snapshot cache");
        match self.storage.load_snapshot::<T>(slot) {
          Ok(Some(cached)) => Ok(CacheResult::offline(cached.items, cached.cached_at)),
          Ok(None) => Err(fetch_err),
          Err(cache_err) => {
            warn!(slot, error = %cache_err, "failed to read snapshot cache");
            Err(fetch_err)
          }
        }
      }
    }
  }
}

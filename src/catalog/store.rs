//! The catalog store: remote fetch, snapshot write-through and cache fallback.
//!
//! State is published through a `watch` channel. Every change replaces the
//! whole [`CatalogState`], so subscribers never observe a half-built snapshot.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::item::CatalogItem;
use crate::cache::{CacheLayer, CacheSource, SnapshotCache};
use crate::error::FetchError;

/// Cache slot holding the last good catalog snapshot.
pub const CATALOG_SLOT: &str = "books";

/// Anything that can produce a full catalog snapshot.
pub trait CatalogSource: Send + Sync {
  fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<CatalogItem>, FetchError>> + Send;
}

/// Where the items currently on display came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
  /// Nothing loaded
  Empty,
  /// Live fetch
  Network { fetched_at: DateTime<Utc> },
  /// Fetch failed, showing an older snapshot
  Offline { cached_at: DateTime<Utc> },
}

#[derive(Debug, Clone)]
pub struct CatalogState {
  pub items: Arc<[CatalogItem]>,
  pub loading: bool,
  pub source: SnapshotSource,
}

impl CatalogState {
  fn initial() -> Self {
    Self {
      items: Arc::from(Vec::new()),
      loading: true,
      source: SnapshotSource::Empty,
    }
  }
}

/// How a `load()` settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
  /// Fresh snapshot with this many items
  Fresh(usize),
  /// Fetch failed, an older snapshot with this many items is shown
  Stale(usize),
  /// Fetch failed and nothing else was available
  Empty,
  /// A later `load()` started first; this result was dropped
  Superseded,
}

pub struct CatalogStore<R: CatalogSource, S: SnapshotCache> {
  source: R,
  cache: CacheLayer<S>,
  deadline: Duration,
  state: watch::Sender<CatalogState>,
  /// Bumped by every `load()`; only the latest may install its result
  generation: AtomicU64,
}

impl<R: CatalogSource, S: SnapshotCache> CatalogStore<R, S> {
  /// New store in the `Loading` state with an empty snapshot.
  pub fn new(source: R, storage: S, deadline: Duration) -> Self {
    let (state, _) = watch::channel(CatalogState::initial());
    Self {
      source,
      cache: CacheLayer::new(storage),
      deadline,
      state,
      generation: AtomicU64::new(0),
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
    self.state.subscribe()
  }

  /// Current state, cloned out of the channel.
  pub fn snapshot(&self) -> CatalogState {
    self.state.borrow().clone()
  }

  /// Fetch the catalog and install the result.
  ///
  /// Never fails: a failed fetch falls back to the cached snapshot, then to
  /// whatever was already in memory. When loads overlap, only the one started
  /// last touches the state or the cache.
  pub async fn load(&self) -> LoadOutcome {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let is_current = || self.generation.load(Ordering::SeqCst) == generation;
    self.state.send_modify(|state| state.loading = true);

    let deadline = self.deadline;
    let result = self
      .cache
      .fetch_snapshot(
        CATALOG_SLOT,
        || async move {
          match tokio::time::timeout(deadline, self.source.fetch_catalog()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(deadline)),
          }
        },
        is_current,
      )
      .await;

    let mut outcome = LoadOutcome::Superseded;
    self.state.send_if_modified(|state| {
      // Checked under the channel lock so a newer load cannot interleave
      if !is_current() {
        return false;
      }
      let (next, settled) = match result {
        Ok(fetched) => {
          let count = fetched.data.len();
          let (source, settled) = match (fetched.source, fetched.cached_at) {
            (CacheSource::Offline, Some(cached_at)) => {
              (SnapshotSource::Offline { cached_at }, LoadOutcome::Stale(count))
            }
            _ => (
              SnapshotSource::Network {
                fetched_at: Utc::now(),
              },
              LoadOutcome::Fresh(count),
            ),
          };
          let next = CatalogState {
            items: Arc::from(fetched.data),
            loading: false,
            source,
          };
          (next, settled)
        }
        // Already logged by the cache layer; keep what's in memory
        Err(_) => keep_in_memory(state.clone()),
      };
      *state = next;
      outcome = settled;
      true
    });

    match outcome {
      LoadOutcome::Fresh(n) => info!(items = n, "catalog loaded"),
      LoadOutcome::Stale(n) => warn!(items = n, "serving cached catalog"),
      LoadOutcome::Empty => warn!("catalog unavailable"),
      LoadOutcome::Superseded => debug!(generation, "discarding superseded catalog load"),
    }

    outcome
  }
}

fn keep_in_memory(previous: CatalogState) -> (CatalogState, LoadOutcome) {
  let source = match previous.source {
    SnapshotSource::Network { fetched_at } => SnapshotSource::Offline {
      cached_at: fetched_at,
    },
    other => other,
  };
  let outcome = if previous.items.is_empty() {
    LoadOutcome::Empty
  } else {
    LoadOutcome::Stale(previous.items.len())
  };
  let state = CatalogState {
    items: previous.items,
    loading: false,
    source,
  };
  (state, outcome)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{FailingStorage, NoopStorage, SqliteStorage};
  use crate::catalog::item::tests::book;
  use std::collections::VecDeque;
  use std::sync::Mutex;

  type Response = Result<Vec<CatalogItem>, FetchError>;

  /// Replays canned responses in order, each after its own delay.
  struct FakeSource {
    responses: Mutex<VecDeque<(Duration, Response)>>,
  }

  impl FakeSource {
    fn new(responses: Vec<Response>) -> Self {
      Self::staged(responses.into_iter().map(|r| (Duration::ZERO, r)).collect())
    }

    fn staged(responses: Vec<(Duration, Response)>) -> Self {
      Self {
        responses: Mutex::new(responses.into()),
      }
    }

    fn slow(delay: Duration) -> Self {
      Self::staged(vec![(delay, Ok(Vec::new()))])
    }
  }

  impl CatalogSource for FakeSource {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, FetchError> {
      // Taken before the delay so overlapping calls keep their order
      let next = self.responses.lock().unwrap().pop_front();
      let (delay, response) = next.unwrap_or_else(|| (Duration::ZERO, Err(unavailable())));
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      response
    }
  }

  fn unavailable() -> FetchError {
    FetchError::Status {
      status: 503,
      message: "unavailable".to_string(),
    }
  }

  fn books() -> Vec<CatalogItem> {
    vec![
      book("1", "Dune", "Ace", "SciFi", 15.0),
      book("2", "Emma", "Penguin", "Classic", 9.0),
    ]
  }

  const DEADLINE: Duration = Duration::from_secs(5);

  #[tokio::test]
  async fn test_starts_loading_and_empty() {
    let store = CatalogStore::new(FakeSource::new(vec![]), NoopStorage, DEADLINE);
    let state = store.snapshot();
    assert!(state.loading);
    assert!(state.items.is_empty());
    assert_eq!(state.source, SnapshotSource::Empty);
  }

  #[tokio::test]
  async fn test_successful_load_publishes_snapshot() {
    let store = CatalogStore::new(
      FakeSource::new(vec![Ok(books())]),
      SqliteStorage::open_in_memory().unwrap(),
      DEADLINE,
    );
    let mut rx = store.subscribe();

    assert_eq!(store.load().await, LoadOutcome::Fresh(2));

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert_eq!(&*state.items, books().as_slice());
    assert!(matches!(state.source, SnapshotSource::Network { .. }));
  }

  #[tokio::test]
  async fn test_failure_without_cache_stays_empty() {
    let store = CatalogStore::new(
      FakeSource::new(vec![Err(unavailable())]),
      SqliteStorage::open_in_memory().unwrap(),
      DEADLINE,
    );

    assert_eq!(store.load().await, LoadOutcome::Empty);

    let state = store.snapshot();
    assert!(!state.loading);
    assert!(state.items.is_empty());
    assert_eq!(state.source, SnapshotSource::Empty);
  }

  #[tokio::test]
  async fn test_failure_falls_back_to_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    // First session fetches and writes through
    {
      let store = CatalogStore::new(
        FakeSource::new(vec![Ok(books())]),
        SqliteStorage::open(&path).unwrap(),
        DEADLINE,
      );
      store.load().await;
    }

    // Next session is offline
    let store = CatalogStore::new(
      FakeSource::new(vec![Err(unavailable())]),
      SqliteStorage::open(&path).unwrap(),
      DEADLINE,
    );
    assert_eq!(store.load().await, LoadOutcome::Stale(2));

    let state = store.snapshot();
    assert!(matches!(state.source, SnapshotSource::Offline { .. }));
    assert!(!state.loading);
    assert_eq!(&*state.items, books().as_slice());
  }

  #[tokio::test]
  async fn test_fetch_replaces_snapshot_wholesale() {
    let store = CatalogStore::new(
      FakeSource::new(vec![
        Ok(books()),
        Ok(vec![book("3", "Beloved", "Knopf", "Fiction", 8.0)]),
      ]),
      NoopStorage,
      DEADLINE,
    );

    store.load().await;
    assert_eq!(store.load().await, LoadOutcome::Fresh(1));
    let state = store.snapshot();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].id, "3");
  }

  #[tokio::test]
  async fn test_failed_refresh_without_cache_keeps_memory() {
    let store = CatalogStore::new(
      FakeSource::new(vec![Ok(books()), Err(unavailable())]),
      NoopStorage,
      DEADLINE,
    );

    store.load().await;
    assert_eq!(store.load().await, LoadOutcome::Stale(2));
    let state = store.snapshot();
    assert!(matches!(state.source, SnapshotSource::Offline { .. }));
    assert_eq!(state.items.len(), 2);
  }

  #[tokio::test]
  async fn test_slow_fetch_times_out() {
    let store = CatalogStore::new(
      FakeSource::slow(Duration::from_secs(30)),
      NoopStorage,
      Duration::from_millis(20),
    );

    assert_eq!(store.load().await, LoadOutcome::Empty);
    assert!(!store.snapshot().loading);
  }

  #[tokio::test]
  async fn test_snapshot_held_by_subscriber_is_not_mutated() {
    let store = CatalogStore::new(
      FakeSource::new(vec![
        Ok(books()),
        Ok(vec![book("3", "Beloved", "Knopf", "Fiction", 8.0)]),
      ]),
      NoopStorage,
      DEADLINE,
    );

    store.load().await;
    let held = store.snapshot().items;
    store.load().await;

    assert_eq!(&*held, books().as_slice());
  }

  fn ids(state: &CatalogState) -> Vec<&str> {
    state.items.iter().map(|i| i.id.as_str()).collect()
  }

  #[tokio::test]
  async fn test_older_load_finishing_last_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let store = CatalogStore::new(
      FakeSource::staged(vec![
        (
          Duration::from_millis(200),
          Ok(vec![book("old", "Dune", "Ace", "SciFi", 15.0)]),
        ),
        (
          Duration::from_millis(20),
          Ok(vec![book("new", "Emma", "Penguin", "Classic", 9.0)]),
        ),
      ]),
      SqliteStorage::open(&path).unwrap(),
      DEADLINE,
    );

    let (older, newer) = futures::future::join(store.load(), store.load()).await;
    assert_eq!(older, LoadOutcome::Superseded);
    assert_eq!(newer, LoadOutcome::Fresh(1));

    let state = store.snapshot();
    assert!(!state.loading);
    assert_eq!(ids(&state), vec!["new"]);

    // The discarded result never reached the cache either
    let cached = SqliteStorage::open(&path)
      .unwrap()
      .load_snapshot::<CatalogItem>(CATALOG_SLOT)
      .unwrap()
      .unwrap();
    assert_eq!(cached.items[0].id, "new");
  }

  #[tokio::test]
  async fn test_superseded_load_leaves_loading_set() {
    let store = CatalogStore::new(
      FakeSource::staged(vec![
        (
          Duration::from_millis(20),
          Ok(vec![book("old", "Dune", "Ace", "SciFi", 15.0)]),
        ),
        (
          Duration::from_millis(200),
          Ok(vec![book("new", "Emma", "Penguin", "Classic", 9.0)]),
        ),
      ]),
      NoopStorage,
      DEADLINE,
    );

    let ((older, loading_after_older), newer) = futures::future::join(
      async {
        let outcome = store.load().await;
        (outcome, store.snapshot().loading)
      },
      store.load(),
    )
    .await;

    assert_eq!(older, LoadOutcome::Superseded);
    assert!(loading_after_older);
    assert_eq!(newer, LoadOutcome::Fresh(1));
    assert_eq!(ids(&store.snapshot()), vec!["new"]);
    assert!(!store.snapshot().loading);
  }

  #[tokio::test]
  async fn test_cache_write_failure_still_publishes_fetch() {
    let store = CatalogStore::new(FakeSource::new(vec![Ok(books())]), FailingStorage, DEADLINE);

    assert_eq!(store.load().await, LoadOutcome::Fresh(2));
    let state = store.snapshot();
    assert!(matches!(state.source, SnapshotSource::Network { .. }));
    assert_eq!(&*state.items, books().as_slice());
  }

  #[tokio::test]
  async fn test_cache_read_failure_counts_as_no_cache() {
    let store = CatalogStore::new(
      FakeSource::new(vec![Err(unavailable())]),
      FailingStorage,
      DEADLINE,
    );
    assert_eq!(store.load().await, LoadOutcome::Empty);
    assert_eq!(store.snapshot().source, SnapshotSource::Empty);

    // With items already in memory, they stay on screen
    let store = CatalogStore::new(
      FakeSource::new(vec![Ok(books()), Err(unavailable())]),
      FailingStorage,
      DEADLINE,
    );
    store.load().await;
    assert_eq!(store.load().await, LoadOutcome::Stale(2));
    assert_eq!(store.snapshot().items.len(), 2);
  }
}

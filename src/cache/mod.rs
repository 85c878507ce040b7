//! Local snapshot caching for offline resilience.
//!
//! This module provides a domain-agnostic caching mechanism that:
//! - Persists the last good snapshot per named slot
//! - Writes through only after a successful network fetch
//! - Serves the persisted snapshot when the network fetch fails

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheBackend, NoopStorage, SqliteStorage};
pub use traits::{CacheSource, SnapshotCache};

#[cfg(test)]
pub(crate) use layer::tests::FailingStorage;

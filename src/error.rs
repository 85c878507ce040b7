//! Error types for the catalog, cache and cart paths.
//!
//! None of these escape to the screen: fetch and cache failures degrade into
//! whatever snapshot is available, cart failures become an alert.

use std::time::Duration;

use thiserror::Error;

/// Reading the catalog collection failed.
#[derive(Debug, Error)]
pub enum FetchError {
  /// HTTP request failed.
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  /// Store answered with a non-success status.
  #[error("store error: {status} - {message}")]
  Status { status: u16, message: String },

  /// A document could not be turned into a catalog item.
  #[error("malformed document {id}: {source}")]
  Decode {
    id: String,
    #[source]
    source: serde_json::Error,
  },

  /// Request URL could not be built.
  #[error("invalid store url: {0}")]
  Url(#[from] url::ParseError),

  /// Listing handed back a page token it already gave out.
  #[error("store repeated page token '{0}'")]
  RepeatedPageToken(String),

  /// No response within the request deadline.
  #[error("timed out after {0:?}")]
  Timeout(Duration),
}

/// Local snapshot persistence failed.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("snapshot serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("failed to create cache directory: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid cached_at timestamp '{0}'")]
  Timestamp(String),

  #[error("could not determine data directory")]
  NoDataDir,

  #[error("cache lock poisoned")]
  Poisoned,
}

/// Appending a document to the cart collection failed.
#[derive(Debug, Error)]
pub enum CartWriteError {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("store error: {status} - {message}")]
  Status { status: u16, message: String },

  /// Item could not be converted into document fields.
  #[error("failed to encode cart entry: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("invalid store url: {0}")]
  Url(#[from] url::ParseError),

  #[error("timed out after {0:?}")]
  Timeout(Duration),
}

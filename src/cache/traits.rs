//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Payloads that can be persisted in a cache backend.
///
/// Blanket-implemented for anything that round-trips through serde and can be
/// moved across tasks.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> Cacheable for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

/// Identifies one slot in the cache.
pub trait CacheKey {
  /// Stable storage key (e.g. "overview", "country:gh")
  fn cache_key(&self) -> String;

  /// Human readable description, used in logs
  fn description(&self) -> String;
}

/// Errors that decide whether a failed refresh may fall back to cached data.
pub trait Recoverable: std::error::Error + Send + Sync + 'static {
  fn is_recoverable(&self) -> bool;
}

/// One emitted result: data, error, or both when stale data is served after a
/// failed refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T, E> {
  /// The payload, if any
  pub data: Option<T>,
  /// The failure that caused a fallback, if any
  pub error: Option<E>,
  /// Where the payload came from
  pub source: CacheSource,
  /// When the payload was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T, E> Outcome<T, E> {
  /// Fresh data from the network.
  pub fn from_network(data: T) -> Self {
    Self {
      data: Some(data),
      error: None,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Data read from the cache before the refresh completed.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data: Some(data),
      error: None,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }

  /// Previously known data re-served together with the failure that prevented
  /// a refresh.
  pub fn fallback(data: T, cached_at: Option<DateTime<Utc>>, error: E) -> Self {
    Self {
      data: Some(data),
      error: Some(error),
      source: CacheSource::Fallback,
      cached_at,
    }
  }

  /// Nothing to report.
  pub fn empty() -> Self {
    Self {
      data: None,
      error: None,
      source: CacheSource::Empty,
      cached_at: None,
    }
  }

  pub fn is_fallback(&self) -> bool {
    self.source == CacheSource::Fallback
  }

  pub fn into_data(self) -> Option<T> {
    self.data
  }
}

/// Indicates where emitted data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, emitted while the refresh is in flight
  Cache,
  /// Data from cache, re-served because the refresh failed
  Fallback,
  /// No data available
  Empty,
}

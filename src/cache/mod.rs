//! Generic caching layer for data persistence and offline support.
//!
//! This module provides a domain-agnostic caching mechanism that:
//! - Persists one serialized payload per cache key
//! - Emits cached data first, then fresh network data (stale-while-revalidate)
//! - Serves stale cache together with the error when a refresh fails recoverably

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, OutcomeStream};
pub use storage::{CacheStorage, Cached, NoopStorage, SqliteStorage};
pub use traits::{CacheKey, CacheSource, Cacheable, Outcome, Recoverable};

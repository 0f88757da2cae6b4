//! Cache layer that orchestrates caching logic with network fetching.

use futures::future::FutureExt;
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::{CacheStorage, Cached};
use super::traits::{CacheKey, Cacheable, Outcome, Recoverable};

/// Ordered results of one cache-backed query. The stream ends after an `Err`.
pub type OutcomeStream<T, E> = BoxStream<'static, Result<Outcome<T, E>, E>>;

/// Cache layer that manages caching logic and network fetching.
///
/// Every query snapshots the cache when it is issued, so concurrent queries for
/// the same key never observe each other's writes mid-flight. The last write
/// wins.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Read a cached payload. Storage failures are logged and count as a miss.
  pub fn read<T: Cacheable>(&self, key: &impl CacheKey) -> Option<Cached<T>> {
    load(&*self.storage, &key.cache_key())
  }

  /// Read a cached payload without its metadata.
  pub fn read_value<T: Cacheable>(&self, key: &impl CacheKey) -> Option<T> {
    self.read(key).map(|cached| cached.value)
  }

  /// Store a payload, reporting whether the write succeeded.
  pub fn write<T: Cacheable>(&self, key: &impl CacheKey, value: &T) -> bool {
    store(&*self.storage, &key.cache_key(), value)
  }

  /// Remove a payload, reporting whether the removal succeeded.
  pub fn remove(&self, key: &impl CacheKey) -> bool {
    let key = key.cache_key();
    match self.storage.remove(&key) {
      Ok(()) => true,
      Err(e) => {
        warn!(key = %key, error = %e, "Failed to remove cache entry");
        false
      }
    }
  }

  /// Cache-then-network with fallback.
  ///
  /// 1. Emit the cached value, if any
  /// 2. Fetch from network; on success update the cache and emit the fresh value
  /// 3. On a recoverable failure emit the cached value again, paired with the
  ///    error; without a cached value, or for any other failure, end the stream
  ///    with the error
  pub fn fetch_with_fallback<T, E, Fut>(&self, key: &impl CacheKey, fetcher: Fut) -> OutcomeStream<T, E>
  where
    T: Cacheable,
    E: Recoverable,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let key_str = key.cache_key();
    let cached = load::<S, T>(&self.storage, &key_str);
    log_snapshot(key, cached.is_some());

    let local = cached
      .clone()
      .map(|c| Ok(Outcome::from_cache(c.value, c.cached_at)));

    let storage = Arc::clone(&self.storage);
    let remote = async move {
      match fetcher.await {
        Ok(data) => {
          store(&*storage, &key_str, &data);
          Ok(Outcome::from_network(data))
        }
        Err(err) if err.is_recoverable() => match cached {
          Some(c) => {
            warn!(key = %key_str, error = %err, "Refresh failed, serving cached data");
            Ok(Outcome::fallback(c.value, Some(c.cached_at), err))
          }
          None => Err(err),
        },
        Err(err) => Err(err),
      }
    };

    local_then_remote(local, remote)
  }

  /// Cache-then-network without fallback.
  ///
  /// Emits the cached value if any, then the fresh value. A failed fetch ends
  /// the stream with the error and leaves the cache untouched.
  pub fn fetch_refresh<T, E, Fut>(&self, key: &impl CacheKey, fetcher: Fut) -> OutcomeStream<T, E>
  where
    T: Cacheable,
    E: Recoverable,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let key_str = key.cache_key();
    let cached = load::<S, T>(&self.storage, &key_str);
    log_snapshot(key, cached.is_some());

    let local = cached.map(|c| Ok(Outcome::from_cache(c.value, c.cached_at)));

    let storage = Arc::clone(&self.storage);
    let remote = async move {
      let data = fetcher.await?;
      store(&*storage, &key_str, &data);
      Ok(Outcome::from_network(data))
    };

    local_then_remote(local, remote)
  }

  /// Network only, writing the result through to the cache.
  pub fn fetch_through<T, E, Fut>(
    &self,
    key: &impl CacheKey,
    fetcher: Fut,
  ) -> BoxStream<'static, Result<T, E>>
  where
    T: Cacheable,
    E: Recoverable,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let key_str = key.cache_key();
    let storage = Arc::clone(&self.storage);

    stream::once(async move {
      let data = fetcher.await?;
      store(&*storage, &key_str, &data);
      Ok(data)
    })
    .boxed()
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}

fn load<S: CacheStorage, T: Cacheable>(storage: &S, key: &str) -> Option<Cached<T>> {
  match storage.get::<T>(key) {
    Ok(cached) => cached,
    Err(e) => {
      warn!(key = %key, error = %e, "Failed to read cache entry, treating as miss");
      None
    }
  }
}

fn store<S: CacheStorage, T: Cacheable>(storage: &S, key: &str, value: &T) -> bool {
  match storage.put(key, value) {
    Ok(()) => true,
    Err(e) => {
      warn!(key = %key, error = %e, "Failed to write cache entry");
      false
    }
  }
}

fn log_snapshot(key: &impl CacheKey, hit: bool) {
  if hit {
    debug!(query = %key.description(), "Cache hit");
  } else {
    debug!(query = %key.description(), "Cache miss");
  }
}

/// Emit `local` (if any) followed by the output of `remote`.
///
/// The remote branch is spawned when the stream is first polled, so it runs
/// while the local item is being consumed, but its output is held back until
/// the local item has been delivered. Dropping the stream cancels the remote
/// branch.
fn local_then_remote<I, Fut>(local: Option<I>, remote: Fut) -> BoxStream<'static, I>
where
  I: Send + 'static,
  Fut: Future<Output = I> + Send + 'static,
{
  stream::once(async move {
    let (task, handle) = remote.remote_handle();
    tokio::spawn(task);
    stream::iter(local).chain(stream::once(handle))
  })
  .flatten()
  .boxed()
}

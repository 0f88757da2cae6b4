//! Cache-backed statistics repository.
//!
//! Every query reads the cache first and emits what it has, then emits the
//! fresh result once the remote call completes:
//!
//! - `overview` and `daily` fall back to the cached value (paired with the
//!   error) when the refresh fails recoverably
//! - `confirmed`, `deaths` and `recovered` never fall back; a failed refresh
//!   ends the stream with the error
//! - `full_stats` and `country` go straight to the network and write through

use futures::future::{self, TryFutureExt};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheLayer, CacheStorage, Outcome, OutcomeStream};

use super::cache::StatsKey;
use super::client::{RemoteFuture, RemoteSource};
use super::error::FetchError;
use super::transform::{find_pinned, merge_full_stats, tag_daily_trends, DailyOrder};
use super::types::{DailyRecord, DetailRecord, Overview, RegionalCount, RegionalDaily};

/// Results of a query that may serve stale data alongside an error
pub type StatsOutcomes<T> = OutcomeStream<T, FetchError>;

/// Plain results of a query; the stream ends after an `Err`
pub type StatsStream<T> = BoxStream<'static, Result<T, FetchError>>;

/// Statistics repository combining a remote source with a local cache.
pub struct Repository<R: RemoteSource, S: CacheStorage> {
  remote: Arc<R>,
  cache: CacheLayer<S>,
  daily_order: DailyOrder,
}

impl<R: RemoteSource, S: CacheStorage> Repository<R, S> {
  pub fn new(remote: R, storage: S) -> Self {
    Self {
      remote: Arc::new(remote),
      cache: CacheLayer::new(storage),
      daily_order: DailyOrder::default(),
    }
  }

  /// Set the order in which daily records are cached and emitted.
  pub fn with_daily_order(mut self, order: DailyOrder) -> Self {
    self.daily_order = order;
    self
  }

  /// Global totals: cached value, then fresh value, with fallback.
  pub fn overview(&self) -> StatsOutcomes<Overview> {
    let fetcher = self.remote.overview().map_err(FetchError::from);
    self.cache.fetch_with_fallback(&StatsKey::Overview, fetcher)
  }

  /// Daily series tagged with trends: cached value, then fresh value, with
  /// fallback.
  pub fn daily(&self) -> StatsOutcomes<Vec<DailyRecord>> {
    let order = self.daily_order;
    let fetcher = self
      .remote
      .daily()
      .map_ok(move |records| tag_daily_trends(records, order))
      .map_err(FetchError::from);
    self.cache.fetch_with_fallback(&StatsKey::Daily, fetcher)
  }

  /// Confirmed cases per location: cached list, then fresh list.
  pub fn confirmed(&self) -> StatsStream<Vec<DetailRecord>> {
    values(self.refresh_list(StatsKey::Confirmed, self.remote.confirmed()))
  }

  /// Deaths per location: cached list, then fresh list.
  pub fn deaths(&self) -> StatsStream<Vec<DetailRecord>> {
    values(self.refresh_list(StatsKey::Deaths, self.remote.deaths()))
  }

  /// Recoveries per location: cached list, then fresh list.
  pub fn recovered(&self) -> StatsStream<Vec<DetailRecord>> {
    values(self.refresh_list(StatsKey::Recovered, self.remote.recovered()))
  }

  /// Totals for one country, read through to the cache.
  pub fn country(&self, id: &str) -> StatsStream<Overview> {
    let fetcher = self.remote.country(id).map_err(FetchError::from);
    self
      .cache
      .fetch_through(&StatsKey::Country(id.to_string()), fetcher)
  }

  /// Confirmed list merged with recovered and death counts.
  ///
  /// The three lists are fetched concurrently; if any of them fails the whole
  /// query fails and nothing is cached.
  pub fn full_stats(&self) -> StatsStream<Vec<DetailRecord>> {
    let confirmed = self.remote.confirmed();
    let recovered = self.remote.recovered();
    let deaths = self.remote.deaths();

    let fetcher = async move {
      let (confirmed, recovered, deaths) = futures::try_join!(confirmed, recovered, deaths)?;
      debug!(
        confirmed = confirmed.len(),
        recovered = recovered.len(),
        deaths = deaths.len(),
        "Merging full stats"
      );
      Ok::<_, FetchError>(merge_full_stats(&confirmed, &recovered, &deaths))
    };

    self.cache.fetch_through(&StatsKey::FullStats, fetcher)
  }

  /// Latest statistics for the pinned location.
  ///
  /// Follows the confirmed query, picking the pinned location out of every
  /// list it emits. If the location is missing from a list or the query
  /// fails, the pinned record itself is emitted together with the error and
  /// the stream ends. Without a pinned location a single empty outcome is
  /// emitted.
  pub fn pinned_region(&self) -> StatsOutcomes<DetailRecord> {
    let Some(pinned) = self.cached_pinned_region() else {
      return stream::once(future::ready(Ok(Outcome::empty()))).boxed();
    };

    self
      .refresh_list(StatsKey::Confirmed, self.remote.confirmed())
      .scan(false, move |finished, item| {
        if *finished {
          return future::ready(None);
        }

        let outcome = match item {
          Ok(outcome) => {
            let source = outcome.source;
            let cached_at = outcome.cached_at;
            let records = outcome.into_data().unwrap_or_default();

            match find_pinned(&records, &pinned) {
              Some(record) => Outcome {
                data: Some(record.clone()),
                error: None,
                source,
                cached_at,
              },
              None => {
                *finished = true;
                let key = pinned.composite_key();
                warn!(key = %key, "Pinned region missing from confirmed list");
                Outcome::fallback(pinned.clone(), None, FetchError::NoMatch { key })
              }
            }
          }
          Err(err) => {
            *finished = true;
            warn!(error = %err, "Pinned region refresh failed");
            Outcome::fallback(pinned.clone(), None, err)
          }
        };

        future::ready(Some(Ok(outcome)))
      })
      .boxed()
  }

  /// Persist `detail` as the pinned location.
  pub fn put_pinned_region(&self, detail: &DetailRecord) -> Result<(), FetchError> {
    if self.set_pinned_region(Some(detail)) {
      debug!(key = %detail.composite_key(), "Pinned region saved");
      Ok(())
    } else {
      Err(FetchError::LocalWrite("Not able to save".to_string()))
    }
  }

  /// Forget the pinned location.
  pub fn remove_pinned_region(&self) -> Result<(), FetchError> {
    if self.set_pinned_region(None) {
      debug!("Pinned region removed");
      Ok(())
    } else {
      Err(FetchError::LocalWrite("Not able to remove".to_string()))
    }
  }

  /// Daily series from the regional endpoint (not cached).
  pub fn regional_daily(&self) -> StatsStream<Vec<RegionalDaily>> {
    stream::once(self.remote.regional_daily().map_err(FetchError::from)).boxed()
  }

  /// Per-region totals from the regional endpoint (not cached).
  pub fn regional_counts(&self) -> StatsStream<Vec<RegionalCount>> {
    stream::once(self.remote.regional_counts().map_err(FetchError::from)).boxed()
  }

  // ==========================================================================
  // Direct cache access (never touches the network)
  // ==========================================================================

  pub fn cached_overview(&self) -> Option<Overview> {
    self.cache.read_value(&StatsKey::Overview)
  }

  pub fn cached_daily(&self) -> Option<Vec<DailyRecord>> {
    self.cache.read_value(&StatsKey::Daily)
  }

  pub fn cached_confirmed(&self) -> Option<Vec<DetailRecord>> {
    self.cache.read_value(&StatsKey::Confirmed)
  }

  pub fn cached_deaths(&self) -> Option<Vec<DetailRecord>> {
    self.cache.read_value(&StatsKey::Deaths)
  }

  pub fn cached_recovered(&self) -> Option<Vec<DetailRecord>> {
    self.cache.read_value(&StatsKey::Recovered)
  }

  pub fn cached_full_stats(&self) -> Option<Vec<DetailRecord>> {
    self.cache.read_value(&StatsKey::FullStats)
  }

  pub fn cached_country(&self, id: &str) -> Option<Overview> {
    self.cache.read_value(&StatsKey::Country(id.to_string()))
  }

  pub fn cached_pinned_region(&self) -> Option<DetailRecord> {
    self.cache.read_value(&StatsKey::PinnedRegion)
  }

  fn set_pinned_region(&self, detail: Option<&DetailRecord>) -> bool {
    let key = StatsKey::PinnedRegion;
    debug!(query = %key.description(), "Updating preference");
    match detail {
      Some(detail) => self.cache.write(&key, detail),
      None => self.cache.remove(&key),
    }
  }

  fn refresh_list(
    &self,
    key: StatsKey,
    fetcher: RemoteFuture<Vec<DetailRecord>>,
  ) -> StatsOutcomes<Vec<DetailRecord>> {
    self
      .cache
      .fetch_refresh(&key, fetcher.map_err(FetchError::from))
  }
}

impl<R: RemoteSource, S: CacheStorage> Clone for Repository<R, S> {
  fn clone(&self) -> Self {
    Self {
      remote: Arc::clone(&self.remote),
      cache: self.cache.clone(),
      daily_order: self.daily_order,
    }
  }
}

/// Strip the envelope from a stream whose items always carry data.
fn values<T: Send + 'static>(outcomes: StatsOutcomes<T>) -> StatsStream<T> {
  outcomes
    .try_filter_map(|outcome| future::ready(Ok(outcome.into_data())))
    .boxed()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, Cached, Cacheable, SqliteStorage};
  use crate::stats::error::{RemoteError, RemoteResult};
  use crate::stats::types::fixtures::{daily, detail, overview};
  use crate::stats::types::Trend;
  use color_eyre::eyre::eyre;
  use futures::FutureExt;

  /// Remote source answering every call with a canned result.
  struct FakeRemote {
    overview: RemoteResult<Overview>,
    daily: RemoteResult<Vec<DailyRecord>>,
    confirmed: RemoteResult<Vec<DetailRecord>>,
    deaths: RemoteResult<Vec<DetailRecord>>,
    recovered: RemoteResult<Vec<DetailRecord>>,
    country: RemoteResult<Overview>,
    regional_daily: RemoteResult<Vec<RegionalDaily>>,
    regional_counts: RemoteResult<Vec<RegionalCount>>,
  }

  impl Default for FakeRemote {
    fn default() -> Self {
      Self {
        overview: Err(unavailable()),
        daily: Err(unavailable()),
        confirmed: Err(unavailable()),
        deaths: Err(unavailable()),
        recovered: Err(unavailable()),
        country: Err(unavailable()),
        regional_daily: Err(unavailable()),
        regional_counts: Err(unavailable()),
      }
    }
  }

  fn canned<T: Clone + Send + 'static>(result: &RemoteResult<T>) -> RemoteFuture<T> {
    future::ready(result.clone()).boxed()
  }

  impl RemoteSource for FakeRemote {
    fn overview(&self) -> RemoteFuture<Overview> {
      canned(&self.overview)
    }

    fn daily(&self) -> RemoteFuture<Vec<DailyRecord>> {
      canned(&self.daily)
    }

    fn confirmed(&self) -> RemoteFuture<Vec<DetailRecord>> {
      canned(&self.confirmed)
    }

    fn deaths(&self) -> RemoteFuture<Vec<DetailRecord>> {
      canned(&self.deaths)
    }

    fn recovered(&self) -> RemoteFuture<Vec<DetailRecord>> {
      canned(&self.recovered)
    }

    fn country(&self, _id: &str) -> RemoteFuture<Overview> {
      canned(&self.country)
    }

    fn regional_daily(&self) -> RemoteFuture<Vec<RegionalDaily>> {
      canned(&self.regional_daily)
    }

    fn regional_counts(&self) -> RemoteFuture<Vec<RegionalCount>> {
      canned(&self.regional_counts)
    }
  }

  /// Storage that reads nothing and refuses every write.
  struct ReadOnlyStorage;

  impl CacheStorage for ReadOnlyStorage {
    fn get<T: Cacheable>(&self, _key: &str) -> color_eyre::Result<Option<Cached<T>>> {
      Ok(None)
    }

    fn put<T: Cacheable>(&self, _key: &str, _value: &T) -> color_eyre::Result<()> {
      Err(eyre!("read-only"))
    }

    fn remove(&self, _key: &str) -> color_eyre::Result<()> {
      Err(eyre!("read-only"))
    }
  }

  fn unavailable() -> RemoteError {
    RemoteError::Status {
      status: 503,
      url: "https://example.org/api/".to_string(),
    }
  }

  fn timeout() -> RemoteError {
    RemoteError::Timeout {
      url: "https://example.org/api/".to_string(),
    }
  }

  fn malformed() -> RemoteError {
    RemoteError::Decode {
      url: "https://example.org/api/".to_string(),
      message: "expected value".to_string(),
    }
  }

  fn repo(remote: FakeRemote) -> Repository<FakeRemote, SqliteStorage> {
    Repository::new(remote, SqliteStorage::open_in_memory().unwrap())
  }

  // --------------------------------------------------------------------------
  // Overview / daily: fallback on recoverable failures
  // --------------------------------------------------------------------------

  #[tokio::test]
  async fn test_overview_cache_then_network() {
    let repo = repo(FakeRemote {
      overview: Ok(overview(20)),
      ..Default::default()
    });
    repo.cache.write(&StatsKey::Overview, &overview(10));

    let items: Vec<_> = repo.overview().try_collect().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].data, Some(overview(10)));
    assert_eq!(items[0].source, CacheSource::Cache);
    assert_eq!(items[1].data, Some(overview(20)));
    assert_eq!(items[1].error, None);
    assert_eq!(repo.cached_overview(), Some(overview(20)));
  }

  #[tokio::test]
  async fn test_overview_recoverable_failure_serves_cache_with_error() {
    let repo = repo(FakeRemote {
      overview: Err(timeout()),
      ..Default::default()
    });
    repo.cache.write(&StatsKey::Overview, &overview(10));

    let items: Vec<_> = repo.overview().try_collect().await.unwrap();
    let last = items.last().unwrap();
    assert_eq!(last.data, Some(overview(10)));
    assert_eq!(last.error, Some(FetchError::Remote(timeout())));
    assert_eq!(repo.cached_overview(), Some(overview(10)));
  }

  #[tokio::test]
  async fn test_overview_failure_without_cache_is_terminal() {
    let repo = repo(FakeRemote::default());

    let items: Vec<_> = repo.overview().collect().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap_err(), &FetchError::Remote(unavailable()));
  }

  #[tokio::test]
  async fn test_overview_unclassified_failure_is_terminal_despite_cache() {
    let repo = repo(FakeRemote {
      overview: Err(malformed()),
      ..Default::default()
    });
    repo.cache.write(&StatsKey::Overview, &overview(10));

    let items: Vec<_> = repo.overview().collect().await;
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert_eq!(items[1].as_ref().unwrap_err(), &FetchError::Remote(malformed()));
    assert_eq!(repo.cached_overview(), Some(overview(10)));
  }

  #[tokio::test]
  async fn test_daily_is_tagged_reversed_and_cached() {
    let repo = repo(FakeRemote {
      daily: Ok(vec![
        daily("d1", 5, 0),
        daily("d2", 5, 0),
        daily("d3", 3, 0),
        daily("d4", 8, 0),
      ]),
      ..Default::default()
    });

    let items: Vec<_> = repo.daily().try_collect().await.unwrap();
    assert_eq!(items.len(), 1);
    let records = items[0].data.clone().unwrap();
    let dates: Vec<_> = records.iter().map(|r| r.report_date.as_str()).collect();
    let trends: Vec<_> = records.iter().map(|r| r.confirmed_trend).collect();

    assert_eq!(dates, vec!["d4", "d3", "d2", "d1"]);
    assert_eq!(
      trends,
      vec![Trend::Increase, Trend::Decrease, Trend::Flat, Trend::Increase]
    );
    assert_eq!(repo.cached_daily(), Some(records));
  }

  #[tokio::test]
  async fn test_daily_order_as_received() {
    let repo = repo(FakeRemote {
      daily: Ok(vec![daily("d1", 1, 0), daily("d2", 2, 0)]),
      ..Default::default()
    })
    .with_daily_order(DailyOrder::AsReceived);

    let items: Vec<_> = repo.daily().try_collect().await.unwrap();
    let records = items[0].data.as_ref().unwrap();
    assert_eq!(records[0].report_date, "d1");
    assert_eq!(records[1].confirmed_trend, Trend::Increase);
  }

  #[tokio::test]
  async fn test_daily_recoverable_failure_serves_cache() {
    let cached = vec![daily("d1", 1, 0)];
    let repo = repo(FakeRemote::default());
    repo.cache.write(&StatsKey::Daily, &cached);

    let items: Vec<_> = repo.daily().try_collect().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].data, Some(cached));
    assert!(items[1].is_fallback());
  }

  // --------------------------------------------------------------------------
  // Confirmed / deaths / recovered: no fallback
  // --------------------------------------------------------------------------

  #[tokio::test]
  async fn test_confirmed_cache_then_network() {
    let fresh = vec![detail("Ghana", None, 20)];
    let repo = repo(FakeRemote {
      confirmed: Ok(fresh.clone()),
      ..Default::default()
    });
    repo
      .cache
      .write(&StatsKey::Confirmed, &vec![detail("Ghana", None, 10)]);

    let items: Vec<_> = repo.confirmed().try_collect().await.unwrap();
    assert_eq!(items, vec![vec![detail("Ghana", None, 10)], fresh.clone()]);
    assert_eq!(repo.cached_confirmed(), Some(fresh));
  }

  #[tokio::test]
  async fn test_deaths_without_cache_emits_only_network() {
    let fresh = vec![detail("Ghana", None, 0)];
    let repo = repo(FakeRemote {
      deaths: Ok(fresh.clone()),
      ..Default::default()
    });

    let items: Vec<_> = repo.deaths().try_collect().await.unwrap();
    assert_eq!(items, vec![fresh]);
  }

  #[tokio::test]
  async fn test_recovered_failure_is_terminal_even_with_cache() {
    let cached = vec![detail("Ghana", None, 0)];
    let repo = repo(FakeRemote {
      recovered: Err(timeout()),
      ..Default::default()
    });
    repo.cache.write(&StatsKey::Recovered, &cached);

    let items: Vec<_> = repo.recovered().collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &cached);
    assert_eq!(items[1].as_ref().unwrap_err(), &FetchError::Remote(timeout()));
    assert_eq!(repo.cached_recovered(), Some(cached));
  }

  // --------------------------------------------------------------------------
  // Full stats and country
  // --------------------------------------------------------------------------

  #[tokio::test]
  async fn test_full_stats_merges_and_caches() {
    let repo = repo(FakeRemote {
      confirmed: Ok(vec![detail("X", None, 10)]),
      recovered: Ok(vec![DetailRecord {
        recovered: 4,
        ..detail("X", None, 0)
      }]),
      deaths: Ok(vec![DetailRecord {
        deaths: 1,
        ..detail("X", None, 0)
      }]),
      ..Default::default()
    });

    let items: Vec<_> = repo.full_stats().try_collect().await.unwrap();
    assert_eq!(items.len(), 1);
    let merged = &items[0];
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].country, "X");
    assert_eq!(merged[0].confirmed, 10);
    assert_eq!(merged[0].recovered, 4);
    assert_eq!(merged[0].deaths, 1);
    assert_eq!(repo.cached_full_stats(), Some(merged.clone()));
  }

  #[tokio::test]
  async fn test_full_stats_single_failure_fails_all() {
    let repo = repo(FakeRemote {
      confirmed: Ok(vec![detail("X", None, 10)]),
      recovered: Ok(Vec::new()),
      deaths: Err(timeout()),
      ..Default::default()
    });

    let items: Vec<_> = repo.full_stats().collect().await;
    assert_eq!(items, vec![Err(FetchError::Remote(timeout()))]);
    assert_eq!(repo.cached_full_stats(), None);
  }

  #[tokio::test]
  async fn test_country_reads_through() {
    let repo = repo(FakeRemote {
      country: Ok(overview(132)),
      ..Default::default()
    });
    assert_eq!(repo.cached_country("GH"), None);

    let items: Vec<_> = repo.country("GH").try_collect().await.unwrap();
    assert_eq!(items, vec![overview(132)]);
    assert_eq!(repo.cached_country("gh"), Some(overview(132)));
  }

  #[tokio::test]
  async fn test_country_failure_is_terminal() {
    let repo = repo(FakeRemote::default());
    repo
      .cache
      .write(&StatsKey::Country("GH".into()), &overview(1));

    let items: Vec<_> = repo.country("GH").collect().await;
    assert_eq!(items, vec![Err(FetchError::Remote(unavailable()))]);
    assert_eq!(repo.cached_country("GH"), Some(overview(1)));
  }

  // --------------------------------------------------------------------------
  // Pinned region
  // --------------------------------------------------------------------------

  #[tokio::test]
  async fn test_pinned_region_without_pin_is_empty() {
    let repo = repo(FakeRemote::default());

    let items: Vec<_> = repo.pinned_region().try_collect().await.unwrap();
    assert_eq!(items, vec![Outcome::empty()]);
  }

  #[tokio::test]
  async fn test_pinned_region_picks_matching_record() {
    let repo = repo(FakeRemote {
      confirmed: Ok(vec![
        detail("Canada", Some("Ontario"), 7),
        detail("Ghana", None, 132),
      ]),
      ..Default::default()
    });
    repo.put_pinned_region(&detail("Ghana", None, 1)).unwrap();

    let items: Vec<_> = repo.pinned_region().try_collect().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].data, Some(detail("Ghana", None, 132)));
    assert_eq!(items[0].source, CacheSource::Network);
  }

  #[tokio::test]
  async fn test_pinned_region_cached_list_first() {
    let repo = repo(FakeRemote {
      confirmed: Ok(vec![detail("Canada", Some("Ontario"), 9)]),
      ..Default::default()
    });
    repo
      .cache
      .write(&StatsKey::Confirmed, &vec![detail("Canada", Some("Ontario"), 8)]);
    repo
      .put_pinned_region(&detail("Canada", Some("Ontario"), 1))
      .unwrap();

    let items: Vec<_> = repo.pinned_region().try_collect().await.unwrap();
    let counts: Vec<_> = items.iter().map(|o| o.data.as_ref().unwrap().confirmed).collect();
    assert_eq!(counts, vec![8, 9]);
    assert_eq!(items[0].source, CacheSource::Cache);
  }

  #[tokio::test]
  async fn test_pinned_region_no_match_falls_back_to_pin() {
    let pinned = detail("Peru", None, 1);
    let repo = repo(FakeRemote {
      confirmed: Ok(vec![detail("Ghana", None, 132)]),
      ..Default::default()
    });
    repo.put_pinned_region(&pinned).unwrap();

    let items: Vec<_> = repo.pinned_region().try_collect().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].data, Some(pinned));
    assert_eq!(
      items[0].error,
      Some(FetchError::NoMatch {
        key: "Peru".to_string()
      })
    );
  }

  #[tokio::test]
  async fn test_pinned_region_no_match_in_cache_ends_stream() {
    let pinned = detail("Peru", None, 1);
    let repo = repo(FakeRemote {
      confirmed: Ok(vec![detail("Peru", None, 50)]),
      ..Default::default()
    });
    repo
      .cache
      .write(&StatsKey::Confirmed, &vec![detail("Ghana", None, 132)]);
    repo.put_pinned_region(&pinned).unwrap();

    let items: Vec<_> = repo.pinned_region().try_collect().await.unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].is_fallback());
  }

  #[tokio::test]
  async fn test_pinned_region_remote_failure_falls_back_to_pin() {
    let pinned = detail("Ghana", None, 1);
    let repo = repo(FakeRemote {
      confirmed: Err(malformed()),
      ..Default::default()
    });
    repo.put_pinned_region(&pinned).unwrap();

    let items: Vec<_> = repo.pinned_region().try_collect().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].data, Some(pinned));
    assert_eq!(items[0].error, Some(FetchError::Remote(malformed())));
  }

  #[test]
  fn test_pin_unpin_round_trip() {
    let repo = repo(FakeRemote::default());
    let pinned = detail("Australia", Some("Victoria"), 5);

    repo.put_pinned_region(&pinned).unwrap();
    let stored = repo.cached_pinned_region().unwrap();
    assert_eq!(stored.composite_key(), pinned.composite_key());
    assert_eq!(stored, pinned);

    repo.remove_pinned_region().unwrap();
    assert_eq!(repo.cached_pinned_region(), None);
  }

  #[test]
  fn test_pin_write_failures_surface() {
    let repo = Repository::new(FakeRemote::default(), ReadOnlyStorage);

    assert_eq!(
      repo.put_pinned_region(&detail("Ghana", None, 1)),
      Err(FetchError::LocalWrite("Not able to save".to_string()))
    );
    assert_eq!(
      repo.remove_pinned_region(),
      Err(FetchError::LocalWrite("Not able to remove".to_string()))
    );
  }

  // --------------------------------------------------------------------------
  // Cache accessors and regional lists
  // --------------------------------------------------------------------------

  #[test]
  fn test_cache_accessors_are_idempotent() {
    let repo = repo(FakeRemote::default());
    repo.cache.write(&StatsKey::Overview, &overview(3));
    repo
      .cache
      .write(&StatsKey::Deaths, &vec![detail("Ghana", None, 0)]);

    assert_eq!(repo.cached_overview(), repo.cached_overview());
    assert_eq!(repo.cached_deaths(), repo.cached_deaths());
    assert_eq!(repo.cached_daily(), None);
    assert_eq!(repo.cached_daily(), None);
  }

  #[tokio::test]
  async fn test_regional_lists_skip_cache() {
    let repo = repo(FakeRemote {
      regional_counts: Ok(vec![RegionalCount {
        region: "Ashanti".to_string(),
        confirmed: 12,
        recovered: 0,
        deaths: 0,
      }]),
      ..Default::default()
    });

    let counts: Vec<_> = repo.regional_counts().try_collect().await.unwrap();
    assert_eq!(counts[0][0].region, "Ashanti");

    let daily: Vec<_> = repo.regional_daily().collect().await;
    assert_eq!(daily, vec![Err(FetchError::Remote(unavailable()))]);
  }
}

//! Cache keys for statistics payloads.

use crate::cache::CacheKey;

/// One cache slot per data category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatsKey {
  Overview,
  Daily,
  Confirmed,
  Deaths,
  Recovered,
  /// Confirmed list merged with recovered and death counts
  FullStats,
  /// Overview of a single country
  Country(String),
  /// The user's pinned location
  PinnedRegion,
}

impl CacheKey for StatsKey {
  fn cache_key(&self) -> String {
    match self {
      Self::Overview => "overview".to_string(),
      Self::Daily => "daily".to_string(),
      Self::Confirmed => "confirmed".to_string(),
      Self::Deaths => "deaths".to_string(),
      Self::Recovered => "recovered".to_string(),
      Self::FullStats => "full_stats".to_string(),
      Self::Country(id) => format!("country:{}", normalize_id(id)),
      Self::PinnedRegion => "pref:pinned_region".to_string(),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::Overview => "global overview".to_string(),
      Self::Daily => "daily summary".to_string(),
      Self::Confirmed => "confirmed cases".to_string(),
      Self::Deaths => "deaths".to_string(),
      Self::Recovered => "recoveries".to_string(),
      Self::FullStats => "full stats".to_string(),
      Self::Country(id) => format!("country {}", id),
      Self::PinnedRegion => "pinned region".to_string(),
    }
  }
}

/// Country ids are matched case-insensitively.
fn normalize_id(id: &str) -> String {
  id.trim().to_lowercase()
}

//! Category-specific reshaping applied to fresh remote data before caching.

use serde::Deserialize;

use super::types::{DailyRecord, DetailRecord, Trend};

/// Order in which tagged daily records are cached and emitted.
///
/// Trends are always computed in the order the API returns the records.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DailyOrder {
  /// Reverse the API order (the API lists oldest first)
  #[default]
  Reversed,
  /// Keep the API order
  AsReceived,
}

/// Tag each record with the direction of its deltas relative to the record
/// before it, starting from zero.
pub fn tag_daily_trends(records: Vec<DailyRecord>, order: DailyOrder) -> Vec<DailyRecord> {
  let mut previous_confirmed = 0;
  let mut previous_recovered = 0;

  let mut tagged: Vec<DailyRecord> = records
    .into_iter()
    .map(|record| {
      let confirmed_trend = Trend::between(record.delta_confirmed, previous_confirmed);
      let recovered_trend = Trend::between(record.delta_recovered, previous_recovered);
      previous_confirmed = record.delta_confirmed;
      previous_recovered = record.delta_recovered;

      DailyRecord {
        confirmed_trend,
        recovered_trend,
        ..record
      }
    })
    .collect();

  if order == DailyOrder::Reversed {
    tagged.reverse();
  }
  tagged
}

/// Whether `candidate` describes the same location as `target`.
///
/// With a region on `target` only the region is compared, otherwise only the
/// country. Two countries sharing a region name therefore collide.
pub fn same_location(candidate: &DetailRecord, target: &DetailRecord) -> bool {
  match target.region.as_deref() {
    Some(region) => candidate.region.as_deref() == Some(region),
    None => candidate.country == target.country,
  }
}

/// Fill recovered and death counts of every confirmed record from the
/// matching entries of the other two lists, defaulting to zero.
pub fn merge_full_stats(
  confirmed: &[DetailRecord],
  recovered: &[DetailRecord],
  deaths: &[DetailRecord],
) -> Vec<DetailRecord> {
  confirmed
    .iter()
    .map(|record| {
      let recovered = recovered
        .iter()
        .find(|r| same_location(r, record))
        .map(|r| r.recovered)
        .unwrap_or(0);
      let deaths = deaths
        .iter()
        .find(|d| same_location(d, record))
        .map(|d| d.deaths)
        .unwrap_or(0);
      record.with_outcomes(recovered, deaths)
    })
    .collect()
}

/// First record matching the pinned location.
pub fn find_pinned<'a>(records: &'a [DetailRecord], pinned: &DetailRecord) -> Option<&'a DetailRecord> {
  records.iter().find(|r| same_location(r, pinned))
}

//! Serde-deserializable types matching the statistics API responses.
//!
//! The API omits or nulls fields freely, so everything here defaults. Domain
//! types in `types.rs` require every field and are built from these.

use serde::Deserialize;

use super::types::{DailyRecord, DetailRecord, Overview, RegionalCount, RegionalDaily, Trend};

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiValue {
  #[serde(default)]
  pub value: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiTotal {
  #[serde(default)]
  pub total: Option<u64>,
}

/// Wrapper used by the regional endpoints
#[derive(Debug, Deserialize)]
pub struct ApiDataEnvelope<T> {
  #[serde(default)]
  pub data: Vec<T>,
}

// ============================================================================
// Location details (/confirmed, /deaths, /recovered)
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiDetail {
  #[serde(default)]
  pub country_region: String,
  #[serde(default, alias = "regionState")]
  pub province_state: Option<String>,
  #[serde(default)]
  pub iso2: Option<String>,
  #[serde(default)]
  pub confirmed: Option<u64>,
  #[serde(default)]
  pub recovered: Option<u64>,
  #[serde(default)]
  pub deaths: Option<u64>,
  #[serde(default)]
  pub last_update: Option<i64>,
  #[serde(default)]
  pub lat: Option<f64>,
  #[serde(default)]
  pub long: Option<f64>,
}

impl ApiDetail {
  pub fn into_record(self) -> DetailRecord {
    DetailRecord {
      country: self.country_region,
      // An empty region means "no region"
      region: self.province_state.filter(|r| !r.is_empty()),
      iso2: self.iso2,
      confirmed: self.confirmed.unwrap_or_default(),
      recovered: self.recovered.unwrap_or_default(),
      deaths: self.deaths.unwrap_or_default(),
      last_update: self.last_update.unwrap_or_default(),
      lat: self.lat.unwrap_or_default(),
      long: self.long.unwrap_or_default(),
    }
  }
}

// ============================================================================
// Overview (/ and /countries/{id})
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiOverview {
  #[serde(default)]
  pub confirmed: ApiValue,
  #[serde(default)]
  pub recovered: ApiValue,
  #[serde(default)]
  pub deaths: ApiValue,
  #[serde(default)]
  pub last_update: String,
  #[serde(default)]
  pub image: Option<String>,
}

impl ApiOverview {
  pub fn into_overview(self) -> Overview {
    Overview {
      confirmed: self.confirmed.value.unwrap_or_default(),
      recovered: self.recovered.value.unwrap_or_default(),
      deaths: self.deaths.value.unwrap_or_default(),
      last_update: self.last_update,
      image: self.image,
    }
  }
}

// ============================================================================
// Daily summary (/daily)
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiDaily {
  #[serde(default)]
  pub report_date: String,
  #[serde(default)]
  pub total_confirmed: Option<u64>,
  #[serde(default)]
  pub total_recovered: Option<u64>,
  #[serde(default)]
  pub delta_confirmed: Option<i64>,
  #[serde(default)]
  pub delta_recovered: Option<i64>,
  #[serde(default)]
  pub deaths: ApiTotal,
}

impl ApiDaily {
  /// Trends start flat; they are assigned once the whole series is known.
  pub fn into_record(self) -> DailyRecord {
    DailyRecord {
      report_date: self.report_date,
      total_confirmed: self.total_confirmed.unwrap_or_default(),
      total_recovered: self.total_recovered.unwrap_or_default(),
      total_deaths: self.deaths.total.unwrap_or_default(),
      delta_confirmed: self.delta_confirmed.unwrap_or_default(),
      delta_recovered: self.delta_recovered.unwrap_or_default(),
      confirmed_trend: Trend::Flat,
      recovered_trend: Trend::Flat,
    }
  }
}

// ============================================================================
// Regional endpoints
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiRegionalDaily {
  #[serde(default)]
  pub date: String,
  #[serde(default)]
  pub confirmed: Option<u64>,
  #[serde(default)]
  pub recovered: Option<u64>,
  #[serde(default)]
  pub deaths: Option<u64>,
}

impl ApiRegionalDaily {
  pub fn into_daily(self) -> RegionalDaily {
    RegionalDaily {
      date: self.date,
      confirmed: self.confirmed.unwrap_or_default(),
      recovered: self.recovered.unwrap_or_default(),
      deaths: self.deaths.unwrap_or_default(),
    }
  }
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiRegionalCount {
  #[serde(default)]
  pub region: String,
  #[serde(default)]
  pub confirmed: Option<u64>,
  #[serde(default)]
  pub recovered: Option<u64>,
  #[serde(default)]
  pub deaths: Option<u64>,
}

impl ApiRegionalCount {
  pub fn into_count(self) -> RegionalCount {
    RegionalCount {
      region: self.region,
      confirmed: self.confirmed.unwrap_or_default(),
      recovered: self.recovered.unwrap_or_default(),
      deaths: self.deaths.unwrap_or_default(),
    }
  }
}

use serde::{Deserialize, Serialize};

/// Statistics for one location (a country, or a region within it)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
  pub country: String,
  pub region: Option<String>,
  pub iso2: Option<String>,
  pub confirmed: u64,
  pub recovered: u64,
  pub deaths: u64,
  /// Epoch milliseconds
  pub last_update: i64,
  pub lat: f64,
  pub long: f64,
}

impl DetailRecord {
  /// "Country" or "Country, Region"
  pub fn display_name(&self) -> String {
    match self.region.as_deref() {
      Some(region) if !region.is_empty() => format!("{}, {}", self.country, region),
      _ => self.country.clone(),
    }
  }

  /// Country and region concatenated. Not unique if two locations happen to
  /// concatenate to the same string.
  pub fn composite_key(&self) -> String {
    format!("{}{}", self.country, self.region.as_deref().unwrap_or_default())
  }

  /// Copy with recovered and death counts replaced.
  pub fn with_outcomes(&self, recovered: u64, deaths: u64) -> Self {
    Self {
      recovered,
      deaths,
      ..self.clone()
    }
  }
}

/// Direction of a daily delta compared to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
  Increase,
  Decrease,
  Flat,
}

impl Trend {
  pub fn between(current: i64, previous: i64) -> Self {
    match current.cmp(&previous) {
      std::cmp::Ordering::Greater => Trend::Increase,
      std::cmp::Ordering::Less => Trend::Decrease,
      std::cmp::Ordering::Equal => Trend::Flat,
    }
  }
}

/// One day of global totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
  pub report_date: String,
  pub total_confirmed: u64,
  pub total_recovered: u64,
  pub total_deaths: u64,
  pub delta_confirmed: i64,
  pub delta_recovered: i64,
  pub confirmed_trend: Trend,
  pub recovered_trend: Trend,
}

/// Global (or per-country) totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
  pub confirmed: u64,
  pub recovered: u64,
  pub deaths: u64,
  pub last_update: String,
  pub image: Option<String>,
}

/// One day of totals from the regional endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalDaily {
  pub date: String,
  pub confirmed: u64,
  pub recovered: u64,
  pub deaths: u64,
}

/// Current totals for one region from the regional endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalCount {
  pub region: String,
  pub confirmed: u64,
  pub recovered: u64,
  pub deaths: u64,
}


#[cfg(test)]
mod tests {
  use super::fixtures::detail;
  use super::*;

  #[test]
  fn test_display_name_without_region() {
    assert_eq!(detail("Ghana", None, 1).display_name(), "Ghana");
  }

  #[test]
  fn test_display_name_with_region() {
    let record = detail("Australia", Some("Victoria"), 1);
    assert_eq!(record.display_name(), "Australia, Victoria");
  }

  #[test]
  fn test_display_name_ignores_empty_region() {
    assert_eq!(detail("France", Some(""), 1).display_name(), "France");
  }

  #[test]
  fn test_composite_key() {
    assert_eq!(detail("Ghana", None, 1).composite_key(), "Ghana");
    assert_eq!(
      detail("Australia", Some("Victoria"), 1).composite_key(),
      "AustraliaVictoria"
    );
  }

  #[test]
  fn test_with_outcomes_keeps_identity() {
    let record = detail("Ghana", None, 10);
    let merged = record.with_outcomes(4, 1);
    assert_eq!(merged.confirmed, 10);
    assert_eq!(merged.recovered, 4);
    assert_eq!(merged.deaths, 1);
    assert_eq!(merged.composite_key(), record.composite_key());
  }

  #[test]
  fn test_trend_between() {
    assert_eq!(Trend::between(5, 0), Trend::Increase);
    assert_eq!(Trend::between(5, 5), Trend::Flat);
    assert_eq!(Trend::between(3, 5), Trend::Decrease);
  }
}

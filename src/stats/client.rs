use color_eyre::{eyre::eyre, Result};
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::stats::api_types::{
  ApiDaily, ApiDataEnvelope, ApiDetail, ApiOverview, ApiRegionalCount, ApiRegionalDaily,
};
use crate::stats::error::{RemoteError, RemoteResult};
use crate::stats::types::{DailyRecord, DetailRecord, Overview, RegionalCount, RegionalDaily};

/// A pending remote call. Nothing is sent until it is polled.
pub type RemoteFuture<T> = BoxFuture<'static, RemoteResult<T>>;

/// One asynchronous call per data category
pub trait RemoteSource: Send + Sync + 'static {
  fn overview(&self) -> RemoteFuture<Overview>;

  fn daily(&self) -> RemoteFuture<Vec<DailyRecord>>;

  fn confirmed(&self) -> RemoteFuture<Vec<DetailRecord>>;

  fn deaths(&self) -> RemoteFuture<Vec<DetailRecord>>;

  fn recovered(&self) -> RemoteFuture<Vec<DetailRecord>>;

  fn country(&self, id: &str) -> RemoteFuture<Overview>;

  /// Daily series from the regional endpoint, unwrapped from its `data` field
  fn regional_daily(&self) -> RemoteFuture<Vec<RegionalDaily>>;

  /// Per-region totals from the regional endpoint, unwrapped from its `data` field
  fn regional_counts(&self) -> RemoteFuture<Vec<RegionalCount>>;
}

/// Statistics API client over HTTP
#[derive(Clone)]
pub struct HttpRemote {
  client: reqwest::Client,
  base_url: Url,
  regional_url: Option<Url>,
}

impl HttpRemote {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("covstat/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let base_url = parse_base(&config.url)?;
    let regional_url = config.regional_url.as_deref().map(parse_base).transpose()?;

    Ok(Self {
      client,
      base_url,
      regional_url,
    })
  }

  /// GET `path` relative to `base` and convert the decoded body.
  fn fetch<A, T>(&self, base: Option<&Url>, path: &str, convert: fn(A) -> T) -> RemoteFuture<T>
  where
    A: DeserializeOwned + Send + 'static,
    T: Send + 'static,
  {
    let client = self.client.clone();
    let url = match base {
      Some(base) => base
        .join(path)
        .map_err(|e| RemoteError::InvalidUrl(format!("{}{}: {}", base, path, e))),
      None => Err(RemoteError::InvalidUrl(
        "regional API url is not configured".to_string(),
      )),
    };

    async move {
      let body: A = get_json(&client, url?).await?;
      Ok(convert(body))
    }
    .boxed()
  }
}

impl RemoteSource for HttpRemote {
  fn overview(&self) -> RemoteFuture<Overview> {
    self.fetch(Some(&self.base_url), "", ApiOverview::into_overview)
  }

  fn daily(&self) -> RemoteFuture<Vec<DailyRecord>> {
    self.fetch(Some(&self.base_url), "daily", |items: Vec<ApiDaily>| -> Vec<DailyRecord> {
      items.into_iter().map(ApiDaily::into_record).collect()
    })
  }

  fn confirmed(&self) -> RemoteFuture<Vec<DetailRecord>> {
    self.fetch(Some(&self.base_url), "confirmed", into_records)
  }

  fn deaths(&self) -> RemoteFuture<Vec<DetailRecord>> {
    self.fetch(Some(&self.base_url), "deaths", into_records)
  }

  fn recovered(&self) -> RemoteFuture<Vec<DetailRecord>> {
    self.fetch(Some(&self.base_url), "recovered", into_records)
  }

  fn country(&self, id: &str) -> RemoteFuture<Overview> {
    let path = format!("countries/{}", id.trim());
    self.fetch(Some(&self.base_url), &path, ApiOverview::into_overview)
  }

  fn regional_daily(&self) -> RemoteFuture<Vec<RegionalDaily>> {
    self.fetch(
      self.regional_url.as_ref(),
      "daily",
      |envelope: ApiDataEnvelope<ApiRegionalDaily>| -> Vec<RegionalDaily> {
        envelope
          .data
          .into_iter()
          .map(ApiRegionalDaily::into_daily)
          .collect()
      },
    )
  }

  fn regional_counts(&self) -> RemoteFuture<Vec<RegionalCount>> {
    self.fetch(
      self.regional_url.as_ref(),
      "regions",
      |envelope: ApiDataEnvelope<ApiRegionalCount>| -> Vec<RegionalCount> {
        envelope
          .data
          .into_iter()
          .map(ApiRegionalCount::into_count)
          .collect()
      },
    )
  }
}

fn into_records(items: Vec<ApiDetail>) -> Vec<DetailRecord> {
  items.into_iter().map(ApiDetail::into_record).collect()
}

/// Parse a base URL, making sure relative joins append to its path.
fn parse_base(raw: &str) -> Result<Url> {
  let mut raw = raw.trim().to_string();
  if !raw.ends_with('/') {
    raw.push('/');
  }
  Url::parse(&raw).map_err(|e| eyre!("Invalid API url '{}': {}", raw, e))
}

async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: Url) -> RemoteResult<T> {
  debug!(url = %url, "Requesting");

  let response = client
    .get(url.clone())
    .send()
    .await
    .map_err(|e| RemoteError::from_reqwest(&e, url.as_str()))?;

  let status = response.status();
  if !status.is_success() {
    return Err(RemoteError::Status {
      status: status.as_u16(),
      url: url.to_string(),
    });
  }

  let body = response
    .bytes()
    .await
    .map_err(|e| RemoteError::from_reqwest(&e, url.as_str()))?;

  serde_json::from_slice(&body).map_err(|e| RemoteError::Decode {
    url: url.to_string(),
    message: e.to_string(),
  })
}

//! Error types for statistics fetching

use std::error::Error as _;
use thiserror::Error;

use crate::cache::Recoverable;

/// Failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
  /// The request did not complete in time
  #[error("Request to {url} timed out")]
  Timeout { url: String },

  /// DNS resolution failed
  #[error("Could not resolve host for {url}")]
  UnresolvedHost { url: String },

  /// The server answered with a non-success status
  #[error("{url} responded with HTTP {status}")]
  Status { status: u16, url: String },

  /// The connection could not be established
  #[error("Failed to connect to {url}: {message}")]
  Connect { url: String, message: String },

  /// The response body did not match the expected shape
  #[error("Failed to decode response from {url}: {message}")]
  Decode { url: String, message: String },

  /// Any other transport failure
  #[error("Request to {url} failed: {message}")]
  Request { url: String, message: String },

  /// The endpoint URL could not be built
  #[error("Invalid endpoint: {0}")]
  InvalidUrl(String),
}

impl RemoteError {
  /// Timeouts, unresolved hosts and non-success statuses may be answered with
  /// cached data. Everything else must surface.
  pub fn is_recoverable(&self) -> bool {
    matches!(
      self,
      RemoteError::Timeout { .. } | RemoteError::UnresolvedHost { .. } | RemoteError::Status { .. }
    )
  }

  /// Classify a transport error from reqwest.
  pub fn from_reqwest(err: &reqwest::Error, url: &str) -> Self {
    let url = url.to_string();

    if err.is_timeout() {
      RemoteError::Timeout { url }
    } else if is_dns_failure(err) {
      RemoteError::UnresolvedHost { url }
    } else if let Some(status) = err.status() {
      RemoteError::Status {
        status: status.as_u16(),
        url,
      }
    } else if err.is_connect() {
      RemoteError::Connect {
        url,
        message: root_message(err),
      }
    } else if err.is_decode() {
      RemoteError::Decode {
        url,
        message: root_message(err),
      }
    } else {
      RemoteError::Request {
        url,
        message: root_message(err),
      }
    }
  }
}

/// Walk the source chain looking for a resolver failure.
fn is_dns_failure(err: &reqwest::Error) -> bool {
  let mut source = std::error::Error::source(err);
  while let Some(e) = source {
    let message = e.to_string();
    if message.contains("dns error") || message.contains("failed to lookup address") {
      return true;
    }
    source = e.source();
  }
  false
}

fn root_message(err: &reqwest::Error) -> String {
  let mut current: &dyn std::error::Error = err;
  while let Some(source) = current.source() {
    current = source;
  }
  current.to_string()
}

/// Failure reported by a repository query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  #[error(transparent)]
  Remote(#[from] RemoteError),

  /// The pinned region has no counterpart in the latest list
  #[error("No record matches pinned region {key}")]
  NoMatch { key: String },

  /// A preference write failed
  #[error("{0}")]
  LocalWrite(String),
}

impl Recoverable for FetchError {
  fn is_recoverable(&self) -> bool {
    match self {
      FetchError::Remote(e) => e.is_recoverable(),
      FetchError::NoMatch { .. } | FetchError::LocalWrite(_) => false,
    }
  }
}

/// Result type for remote calls
pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_recoverable_taxonomy() {
    let url = "https://example.org/api/".to_string();

    assert!(RemoteError::Timeout { url: url.clone() }.is_recoverable());
    assert!(RemoteError::UnresolvedHost { url: url.clone() }.is_recoverable());
    assert!(RemoteError::Status {
      status: 503,
      url: url.clone()
    }
    .is_recoverable());

    assert!(!RemoteError::Connect {
      url: url.clone(),
      message: "refused".into()
    }
    .is_recoverable());
    assert!(!RemoteError::Decode {
      url: url.clone(),
      message: "eof".into()
    }
    .is_recoverable());
    assert!(!RemoteError::InvalidUrl(url).is_recoverable());
  }

  #[test]
  fn test_fetch_error_delegates_to_remote() {
    let timeout = FetchError::from(RemoteError::Timeout {
      url: "https://example.org/".into(),
    });
    assert!(timeout.is_recoverable());

    let no_match = FetchError::NoMatch {
      key: "Ghana".into(),
    };
    assert!(!no_match.is_recoverable());
    assert!(!FetchError::LocalWrite("Not able to save".into()).is_recoverable());
  }

  #[test]
  fn test_messages() {
    let err = FetchError::from(RemoteError::Status {
      status: 404,
      url: "https://example.org/api/daily".into(),
    });
    assert_eq!(
      err.to_string(),
      "https://example.org/api/daily responded with HTTP 404"
    );
    assert_eq!(
      FetchError::LocalWrite("Not able to remove".into()).to_string(),
      "Not able to remove"
    );
  }
}

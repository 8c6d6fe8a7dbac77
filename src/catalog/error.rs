use std::time::Duration;

/// Failure below the HTTP status layer: nothing usable came back.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
  #[error("request timed out after {}ms", .0.as_millis())]
  Timeout(Duration),
  #[error("network error: {0}")]
  Network(String),
}

/// Errors surfaced by the catalog client.
///
/// Only `Network` is produced after retrying; everything else fails on the
/// first attempt.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
  #[error("request failed after {attempts} attempts: {source}")]
  Network {
    attempts: u32,
    #[source]
    source: TransportError,
  },

  #[error("HTTP {status}: {body}")]
  UpstreamStatus { status: u16, body: String },

  #[error("invalid {context} response structure")]
  InvalidResponseShape { context: &'static str },

  #[error("failed to decode response body: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("invalid request url: {0}")]
  InvalidUrl(String),

  #[error("failed to build HTTP client: {0}")]
  ClientBuild(#[source] reqwest::Error),

  #[error("product id is required")]
  MissingProductId,
}

impl CatalogError {
  /// True when the failure came from the network layer rather than the
  /// upstream's answer.
  pub fn is_transport(&self) -> bool {
    matches!(self, CatalogError::Network { .. })
  }
}

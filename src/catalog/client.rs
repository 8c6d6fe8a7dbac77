//! HTTP access to the catalog API with per-attempt timeouts and retries.

use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{CatalogError, TransportError};

/// Raw HTTP response: status code and body text.
#[derive(Debug, Clone)]
pub struct TransportResponse {
  pub status: u16,
  pub body: String,
}

impl TransportResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Performs a single GET request.
///
/// Implementations must not apply their own retry policy; timeouts are
/// enforced by dropping the returned future.
pub trait Transport: Send + Sync {
  fn get(
    &self,
    url: &str,
    headers: &[(String, String)],
  ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// Transport backed by a shared reqwest client
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new() -> Result<Self, CatalogError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("storefront-catalog/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(CatalogError::ClientBuild)?;
    Ok(Self { client })
  }
}

impl Transport for ReqwestTransport {
  fn get(
    &self,
    url: &str,
    headers: &[(String, String)],
  ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
    let mut request = self
      .client
      .get(url)
      .header(reqwest::header::CONTENT_TYPE, "application/json")
      .header(reqwest::header::ACCEPT, "application/json");
    for (name, value) in headers {
      request = request.header(name.as_str(), value.as_str());
    }

    async move {
      let response = request
        .send()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;
      let status = response.status().as_u16();
      let body = response
        .text()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;
      Ok(TransportResponse { status, body })
    }
  }
}

/// Timeout and retry settings applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first
  pub attempts: u32,
  /// Per-attempt timeout
  pub timeout: Duration,
  /// Delay before the first retry; doubles for each one after
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      attempts: 3,
      timeout: Duration::from_millis(10_000),
      base_delay: Duration::from_secs(1),
    }
  }
}

impl RetryPolicy {
  /// Delay after `attempts_used` failed attempts: `base_delay * 2^(attempts_used - 1)`.
  pub fn backoff_delay(&self, attempts_used: u32) -> Duration {
    let exponent = attempts_used.saturating_sub(1).min(16);
    self.base_delay.saturating_mul(1 << exponent)
  }
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  /// Extra headers sent with the request
  pub headers: Vec<(String, String)>,
  /// Attempt budget for this call instead of the policy's
  pub attempts: Option<u32>,
}

/// JSON-over-HTTP client with retry.
///
/// Holds no state between calls besides the transport and the policy.
#[derive(Clone)]
pub struct HttpClient<T = ReqwestTransport> {
  transport: T,
  policy: RetryPolicy,
}

impl HttpClient<ReqwestTransport> {
  pub fn new(policy: RetryPolicy) -> Result<Self, CatalogError> {
    Ok(Self::with_transport(ReqwestTransport::new()?, policy))
  }
}

impl<T: Transport> HttpClient<T> {
  pub fn with_transport(transport: T, policy: RetryPolicy) -> Self {
    Self { transport, policy }
  }

  pub fn policy(&self) -> &RetryPolicy {
    &self.policy
  }

  /// GET `url` with default options.
  pub async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
    self.request(url, &RequestOptions::default()).await
  }

  /// GET `url` and parse the body as JSON.
  ///
  /// Timeouts and transport failures are retried with exponential backoff
  /// until the attempt budget is spent. A non-success status or a body that
  /// is not JSON fails straight away.
  pub async fn request(&self, url: &str, options: &RequestOptions) -> Result<Value, CatalogError> {
    let budget = options.attempts.unwrap_or(self.policy.attempts).max(1);
    let mut attempt = 0;

    loop {
      attempt += 1;
      debug!(url, attempt, budget, "sending request");

      let failure = match tokio::time::timeout(
        self.policy.timeout,
        self.transport.get(url, &options.headers),
      )
      .await
      {
        Err(_) => TransportError::Timeout(self.policy.timeout),
        Ok(Err(err)) => err,
        Ok(Ok(response)) if !response.is_success() => {
          return Err(CatalogError::UpstreamStatus {
            status: response.status,
            body: response.body,
          });
        }
        Ok(Ok(response)) => return Ok(serde_json::from_str(&response.body)?),
      };

      if attempt >= budget {
        return Err(CatalogError::Network {
          attempts: attempt,
          source: failure,
        });
      }

      let delay = self.policy.backoff_delay(attempt);
      warn!(
        url,
        error = %failure,
        attempt,
        budget,
        delay_ms = delay.as_millis() as u64,
        "request failed, retrying"
      );
      tokio::time::sleep(delay).await;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::testing::{ScriptedTransport, Step};
  use serde_json::json;
  use tokio::time::Instant;

  fn client(transport: ScriptedTransport) -> HttpClient<ScriptedTransport> {
    HttpClient::with_transport(transport, RetryPolicy::default())
  }

  #[test]
  fn test_backoff_delays() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.backoff_delay(1), Duration::from_secs(1));
    assert_eq!(policy.backoff_delay(2), Duration::from_secs(2));
    assert_eq!(policy.backoff_delay(3), Duration::from_secs(4));
  }

  #[tokio::test]
  async fn test_success_returns_json() {
    let transport = ScriptedTransport::new(vec![Step::ok(json!({"code": 200}))]);
    let value = client(transport.clone()).get_json("http://api/x").await.unwrap();
    assert_eq!(value, json!({"code": 200}));
    assert_eq!(transport.calls(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_always_timing_out_uses_whole_budget() {
    let transport = ScriptedTransport::new(vec![]);
    let started = Instant::now();

    let err = client(transport.clone())
      .get_json("http://api/products")
      .await
      .unwrap_err();

    assert_eq!(transport.calls(), 3);
    assert!(matches!(
      err,
      CatalogError::Network {
        attempts: 3,
        source: TransportError::Timeout(_)
      }
    ));
    // three 10s timeouts plus 1s and 2s of backoff
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(33), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(33_100), "elapsed {:?}", elapsed);
  }

  #[tokio::test(start_paused = true)]
  async fn test_backoff_between_attempts() {
    let transport = ScriptedTransport::new(vec![
      Step::fail("connection refused"),
      Step::fail("connection reset"),
      Step::ok(json!([])),
    ]);
    let started = Instant::now();

    let value = client(transport.clone()).get_json("http://api/x").await.unwrap();

    assert_eq!(value, json!([]));
    assert_eq!(transport.calls(), 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3_100), "elapsed {:?}", elapsed);
  }

  #[tokio::test]
  async fn test_error_status_is_not_retried() {
    let transport = ScriptedTransport::new(vec![
      Step::status(503, "unavailable"),
      Step::ok(json!([])),
    ]);
    let err = client(transport.clone()).get_json("http://api/x").await.unwrap_err();

    assert_eq!(transport.calls(), 1);
    match err {
      CatalogError::UpstreamStatus { status, body } => {
        assert_eq!(status, 503);
        assert_eq!(body, "unavailable");
      }
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_invalid_json_is_not_retried() {
    let transport = ScriptedTransport::new(vec![Step::status(200, "<html>")]);
    let err = client(transport.clone()).get_json("http://api/x").await.unwrap_err();
    assert!(matches!(err, CatalogError::Decode(_)));
    assert_eq!(transport.calls(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_attempt_override() {
    let transport = ScriptedTransport::new(vec![]);
    let options = RequestOptions {
      attempts: Some(1),
      ..Default::default()
    };
    let err = client(transport.clone())
      .request("http://api/x", &options)
      .await
      .unwrap_err();
    assert!(matches!(err, CatalogError::Network { attempts: 1, .. }));
    assert_eq!(transport.calls(), 1);
  }

  #[tokio::test]
  async fn test_headers_are_forwarded() {
    let transport = ScriptedTransport::new(vec![Step::ok(json!({}))]);
    let options = RequestOptions {
      headers: vec![("X-Trace".to_string(), "abc".to_string())],
      ..Default::default()
    };
    client(transport.clone())
      .request("http://api/x", &options)
      .await
      .unwrap();
    assert_eq!(
      transport.last_headers(),
      vec![("X-Trace".to_string(), "abc".to_string())]
    );
  }
}

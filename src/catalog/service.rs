//! Catalog service: the entry point the storefront UI calls into.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheLayer, CacheResult, CacheSource};
use crate::config::Config;

use super::api_types::{has_worker_data, ProductDetailEnvelope, ProductListEnvelope};
use super::client::{HttpClient, ReqwestTransport, Transport};
use super::demo;
use super::error::CatalogError;
use super::filter::filter_customizable;
use super::normalize::normalize;
use super::types::ProductRecord;

/// Cache of the filtered product list.
pub type ProductCache = CacheLayer<Vec<ProductRecord>>;

/// URLs of the upstream endpoints.
#[derive(Debug, Clone)]
pub struct Endpoints {
  base: Url,
}

impl Endpoints {
  pub fn new(base_url: &str) -> Result<Self, CatalogError> {
    let base =
      Url::parse(base_url).map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    if base.cannot_be_a_base() {
      return Err(CatalogError::InvalidUrl(base_url.to_string()));
    }
    Ok(Self { base })
  }

  fn join(&self, segments: &[&str]) -> String {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url.to_string()
  }

  pub fn products(&self) -> String {
    self.join(&["products"])
  }

  pub fn product(&self, id: &str) -> String {
    self.join(&["products", id])
  }

  pub fn health(&self) -> String {
    self.join(&["health"])
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
  Healthy,
  Error,
}

/// Result of probing the worker's health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct WorkerHealth {
  pub status: HealthStatus,
  pub response_time_ms: Option<u64>,
  pub platform: Option<String>,
  pub api_configured: Option<bool>,
  pub version: Option<String>,
  pub timestamp: Option<String>,
  pub error: Option<String>,
}

/// Result of probing the products endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ApiHealth {
  pub status: HealthStatus,
  pub response_time_ms: Option<u64>,
  /// Whether the worker envelope with an array result came back
  pub has_data: bool,
  pub product_count: usize,
  pub error: Option<String>,
}

/// Loads products through cache, network, stale cache and demo data, in
/// that order. Fetch failures never reach the caller.
#[derive(Clone)]
pub struct CatalogService<T = ReqwestTransport> {
  client: HttpClient<T>,
  endpoints: Endpoints,
  cache: Arc<ProductCache>,
}

impl CatalogService<ReqwestTransport> {
  /// Create a service talking to the configured API over HTTP.
  pub fn new(config: &Config) -> Result<Self, CatalogError> {
    let client = HttpClient::new(config.retry_policy())?;
    Self::with_client(client, config)
  }
}

impl<T: Transport> CatalogService<T> {
  /// Create a service over an arbitrary transport.
  pub fn with_transport(transport: T, config: &Config) -> Result<Self, CatalogError> {
    Self::with_client(
      HttpClient::with_transport(transport, config.retry_policy()),
      config,
    )
  }

  fn with_client(client: HttpClient<T>, config: &Config) -> Result<Self, CatalogError> {
    let endpoints = Endpoints::new(&config.api.base_url)?;
    let cache = Arc::new(ProductCache::new().with_stale_time(config.cache_ttl()));
    Ok(Self {
      client,
      endpoints,
      cache,
    })
  }

  /// Share an existing cache instead of the service's own.
  pub fn with_cache(mut self, cache: Arc<ProductCache>) -> Self {
    self.cache = cache;
    self
  }

  pub fn cache(&self) -> &Arc<ProductCache> {
    &self.cache
  }

  pub fn endpoints(&self) -> &Endpoints {
    &self.endpoints
  }

  /// Load the displayable product list.
  pub async fn load_products(&self, force_refresh: bool) -> Vec<ProductRecord> {
    self.load_products_with_source(force_refresh).await.data
  }

  /// Load the displayable product list, reporting where it came from.
  pub async fn load_products_with_source(
    &self,
    force_refresh: bool,
  ) -> CacheResult<Vec<ProductRecord>> {
    match self
      .cache
      .fetch(force_refresh, || self.fetch_products())
      .await
    {
      Ok(result) => {
        match result.source {
          CacheSource::CacheFresh => debug!(count = result.data.len(), "using cached products"),
          CacheSource::CacheStale => warn!(
            count = result.data.len(),
            cached_at = ?result.cached_at,
            "using expired cache due to API error"
          ),
          CacheSource::Network | CacheSource::Demo => {}
        }
        result
      }
      Err(err) => {
        warn!(error = %err, "no cache available, showing demo products");
        CacheResult::demo(demo::demo_catalog())
      }
    }
  }

  async fn fetch_products(&self) -> Result<Vec<ProductRecord>, CatalogError> {
    let url = self.endpoints.products();
    info!(url = %url, "loading products from API");

    let response = self.client.get_json(&url).await?;
    let envelope = ProductListEnvelope::decode(response)?;
    debug!(shape = envelope.shape(), "decoded product list");

    let products: Vec<ProductRecord> = envelope.into_products().iter().map(normalize).collect();
    let received = products.len();
    let filtered = filter_customizable(products);

    info!(
      received,
      shown = filtered.len(),
      "loaded customizable products from API"
    );
    Ok(filtered)
  }

  /// Load one product by id.
  ///
  /// Any fetch or decode failure yields a demo record for the id. The only
  /// error is an empty id.
  pub async fn load_product(&self, product_id: &str) -> Result<ProductRecord, CatalogError> {
    if product_id.trim().is_empty() {
      return Err(CatalogError::MissingProductId);
    }

    match self.fetch_product(product_id).await {
      Ok(product) => Ok(product),
      Err(err) => {
        warn!(product_id, error = %err, "error loading product, using demo data");
        Ok(demo::demo_product(product_id))
      }
    }
  }

  async fn fetch_product(&self, product_id: &str) -> Result<ProductRecord, CatalogError> {
    let response = self
      .client
      .get_json(&self.endpoints.product(product_id))
      .await?;
    let raw = ProductDetailEnvelope::decode(response)?.into_raw_product();
    Ok(normalize(&raw))
  }

  /// Drop the cached product list.
  pub fn clear_cache(&self) {
    self.cache.clear();
    info!("products cache cleared");
  }

  /// Probe the worker's health endpoint.
  pub async fn check_worker_health(&self) -> WorkerHealth {
    let started = Instant::now();
    match self.client.get_json(&self.endpoints.health()).await {
      Ok(response) => WorkerHealth {
        status: HealthStatus::Healthy,
        response_time_ms: Some(started.elapsed().as_millis() as u64),
        platform: Some(
          response
            .get("platform")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        ),
        api_configured: response.get("api_configured").and_then(Value::as_bool),
        version: response
          .get("version")
          .and_then(Value::as_str)
          .map(String::from),
        timestamp: response
          .get("timestamp")
          .and_then(Value::as_str)
          .map(String::from),
        error: None,
      },
      Err(err) => WorkerHealth {
        status: HealthStatus::Error,
        response_time_ms: None,
        platform: None,
        api_configured: None,
        version: None,
        timestamp: Some(Utc::now().to_rfc3339()),
        error: Some(err.to_string()),
      },
    }
  }

  /// Probe the products endpoint without touching the cache.
  pub async fn check_api_health(&self) -> ApiHealth {
    let started = Instant::now();
    match self.client.get_json(&self.endpoints.products()).await {
      Ok(response) => ApiHealth {
        status: HealthStatus::Healthy,
        response_time_ms: Some(started.elapsed().as_millis() as u64),
        has_data: has_worker_data(&response),
        product_count: response
          .get("result")
          .and_then(Value::as_array)
          .map(Vec::len)
          .unwrap_or(0),
        error: None,
      },
      Err(err) => ApiHealth {
        status: HealthStatus::Error,
        response_time_ms: None,
        has_data: false,
        product_count: 0,
        error: Some(err.to_string()),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::testing::{ScriptedTransport, Step};
  use crate::catalog::types::{Category, ItemId};
  use serde_json::json;
  use std::time::Duration;

  fn test_config() -> Config {
    let mut config = Config::default();
    config.api.base_url = "http://api.test/api".to_string();
    config
  }

  fn service(steps: Vec<Step>) -> (CatalogService<ScriptedTransport>, ScriptedTransport) {
    let transport = ScriptedTransport::new(steps);
    let service = CatalogService::with_transport(transport.clone(), &test_config()).unwrap();
    (service, transport)
  }

  fn tee_list() -> Value {
    json!({
      "code": 200,
      "result": [{
        "id": 1,
        "name": "T-SHIRT Basic",
        "variants": 5,
        "synced": 5,
        "thumbnail_url": "x.png"
      }]
    })
  }

  #[test]
  fn test_endpoints() {
    let endpoints = Endpoints::new("http://api.test/api/").unwrap();
    assert_eq!(endpoints.products(), "http://api.test/api/products");
    assert_eq!(endpoints.product("42"), "http://api.test/api/products/42");
    assert_eq!(endpoints.health(), "http://api.test/api/health");
    assert_eq!(
      endpoints.product("a/b"),
      "http://api.test/api/products/a%2Fb"
    );
    assert!(Endpoints::new("not a url").is_err());
  }

  #[tokio::test]
  async fn test_live_load_normalizes_and_caches() {
    let (service, transport) = service(vec![Step::ok(tee_list())]);

    let result = service.load_products_with_source(false).await;

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.len(), 1);
    let product = &result.data[0];
    assert_eq!(product.category, Category::Ropa);
    assert_eq!(product.type_name, "T-Shirt");
    assert_eq!(product.variant_count, 5);
    assert_eq!(transport.urls(), vec!["http://api.test/api/products"]);
    assert!(service.cache().is_fresh());
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_network() {
    let (service, transport) = service(vec![Step::ok(tee_list())]);
    service.load_products(false).await;

    let result = service.load_products_with_source(false).await;

    assert_eq!(result.source, CacheSource::CacheFresh);
    assert_eq!(result.data.len(), 1);
    assert_eq!(transport.calls(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_timeouts_without_cache_return_demo_catalog() {
    let (service, transport) = service(vec![]);

    let result = service.load_products_with_source(false).await;

    assert_eq!(result.source, CacheSource::Demo);
    assert_eq!(result.data, demo::demo_catalog());
    assert!(!result.data.is_empty());
    assert_eq!(transport.calls(), 3);
    // demo data is never cached
    assert!(service.cache().stale_entry().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_timeouts_with_cache_return_stale_list() {
    let (service, transport) = service(vec![Step::ok(tee_list())]);
    let first = service.load_products(false).await;

    tokio::time::advance(Duration::from_secs(600)).await;
    let result = service.load_products_with_source(false).await;

    assert_eq!(result.source, CacheSource::CacheStale);
    assert_eq!(result.data, first);
    assert_eq!(transport.calls(), 4);
  }

  #[tokio::test]
  async fn test_forced_refresh_failure_falls_back_to_cache() {
    let (service, transport) = service(vec![
      Step::ok(tee_list()),
      Step::status(500, "boom"),
    ]);
    let first = service.load_products(false).await;

    let result = service.load_products_with_source(true).await;

    assert_eq!(result.source, CacheSource::CacheStale);
    assert_eq!(result.data, first);
    assert_eq!(transport.calls(), 2);
  }

  #[tokio::test]
  async fn test_forced_refresh_replaces_cache() {
    let (service, _) = service(vec![
      Step::ok(tee_list()),
      Step::ok(json!({"items": [
        {"id": 2, "name": "Coffee Mug", "variants": 1},
        {"id": 3, "name": "Zip Hoodie", "variants": 2}
      ]})),
    ]);
    service.load_products(false).await;

    let products = service.load_products(true).await;

    assert_eq!(products.len(), 2);
    assert_eq!(service.cache().get().map(|p| p.len()), Some(2));
  }

  #[tokio::test]
  async fn test_sample_products_are_filtered_out() {
    let (service, _) = service(vec![Step::ok(json!([
      {"id": 1, "name": "Sample Mockup Tee", "available": true, "variants": 3},
      {"id": 2, "name": "Classic Tee", "available": true, "variants": 3}
    ]))]);

    let products = service.load_products(false).await;

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, ItemId::Number(2));
  }

  #[tokio::test]
  async fn test_unrecognized_shape_falls_back_to_demo() {
    let (service, transport) = service(vec![Step::ok(json!({"data": []}))]);

    let result = service.load_products_with_source(false).await;

    assert_eq!(result.source, CacheSource::Demo);
    assert_eq!(transport.calls(), 1);
  }

  #[tokio::test]
  async fn test_clear_cache_forces_refetch() {
    let (service, transport) = service(vec![Step::ok(tee_list()), Step::ok(tee_list())]);
    service.load_products(false).await;

    service.clear_cache();
    let result = service.load_products_with_source(false).await;

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(transport.calls(), 2);
  }

  #[tokio::test]
  async fn test_shared_cache_between_services() {
    let (first, _) = service(vec![Step::ok(tee_list())]);
    first.load_products(false).await;

    let (second, transport) = service(vec![]);
    let second = second.with_cache(Arc::clone(first.cache()));
    let result = second.load_products_with_source(false).await;

    assert_eq!(result.source, CacheSource::CacheFresh);
    assert_eq!(transport.calls(), 0);
  }

  #[tokio::test]
  async fn test_load_product_synced_envelope() {
    let (service, transport) = service(vec![Step::ok(json!({
      "code": 200,
      "result": {
        "sync_product": {"id": 9, "name": "Zip Hoodie", "thumbnail_url": "h.png"},
        "sync_variants": [
          {"id": 90, "size": "S", "retail_price": "30.00", "files": [{"id": 1, "type": "preview"}]},
          {"id": 91, "size": "M", "retail_price": "30.00", "files": [{"id": 1, "type": "preview"}]}
        ]
      }
    }))]);

    let product = service.load_product("9").await.unwrap();

    assert_eq!(transport.urls(), vec!["http://api.test/api/products/9"]);
    assert_eq!(product.id, ItemId::Number(9));
    assert_eq!(product.variant_count, 2);
    assert_eq!(product.variants[1].size.as_deref(), Some("M"));
    assert_eq!(product.files.len(), 1);
    assert_eq!(product.type_name, "Hoodie");
  }

  #[tokio::test]
  async fn test_load_product_thumbnail_from_variant_preview() {
    let (service, _) = service(vec![Step::ok(json!({
      "code": 200,
      "result": {
        "sync_product": {"id": 9, "name": "Zip Hoodie"},
        "sync_variants": [
          {"id": 90, "files": [{"id": 1, "type": "preview", "preview_url": "p.png"}]}
        ]
      }
    }))]);

    let product = service.load_product("9").await.unwrap();

    assert_eq!(product.files.len(), 1);
    assert_eq!(product.thumbnail_url, "p.png");
  }

  #[tokio::test]
  async fn test_load_product_failure_returns_demo_record() {
    let (service, _) = service(vec![Step::status(404, "not found")]);

    let product = service.load_product("123").await.unwrap();

    assert_eq!(product.id, ItemId::Text("123".to_string()));
    assert_eq!(product.name, "Demo Product 123");
  }

  #[tokio::test]
  async fn test_load_product_requires_id() {
    let (service, transport) = service(vec![]);
    let err = service.load_product("  ").await.unwrap_err();
    assert!(matches!(err, CatalogError::MissingProductId));
    assert_eq!(transport.calls(), 0);
  }

  #[tokio::test]
  async fn test_worker_health() {
    let (service, transport) = service(vec![Step::ok(json!({
      "status": "ok",
      "platform": "Cloudflare Workers",
      "api_configured": true,
      "version": "1.2.0",
      "timestamp": "2026-01-01T00:00:00Z"
    }))]);

    let health = service.check_worker_health().await;

    assert_eq!(transport.urls(), vec!["http://api.test/api/health"]);
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.platform.as_deref(), Some("Cloudflare Workers"));
    assert_eq!(health.api_configured, Some(true));
    assert!(health.error.is_none());
  }

  #[tokio::test]
  async fn test_worker_health_error() {
    let (service, _) = service(vec![Step::status(502, "bad gateway")]);
    let health = service.check_worker_health().await;
    assert_eq!(health.status, HealthStatus::Error);
    assert_eq!(health.error.as_deref(), Some("HTTP 502: bad gateway"));
    assert!(health.timestamp.is_some());
  }

  #[tokio::test]
  async fn test_api_health() {
    let (service, _) = service(vec![Step::ok(tee_list()), Step::ok(json!({"items": []}))]);

    let health = service.check_api_health().await;
    assert_eq!(health.status, HealthStatus::Healthy);
    assert!(health.has_data);
    assert_eq!(health.product_count, 1);

    let health = service.check_api_health().await;
    assert!(!health.has_data);
    assert_eq!(health.product_count, 0);
    // health checks bypass the cache
    assert!(service.cache().stale_entry().is_none());
  }
}

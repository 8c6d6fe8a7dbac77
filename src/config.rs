use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::RetryPolicy;

/// Worker that relays the fulfillment API.
pub const DEFAULT_BASE_URL: &str = "https://printful-worker.liendoalejandro94.workers.dev/api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base URL; endpoints are appended as path segments
  pub base_url: String,
  /// Per-attempt timeout in milliseconds
  pub timeout_ms: u64,
  /// Total attempts per request, including the first
  pub retry_attempts: u32,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout_ms: 10_000,
      retry_attempts: 3,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Seconds before the cached product list is considered stale
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { ttl_secs: 300 }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Filter directive used when RUST_LOG is unset (e.g. "info", "storefront_catalog=debug")
  pub level: String,
  /// Also write logs to this file
  pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration, falling back to built-in defaults.
  ///
  /// An explicit path must exist. Otherwise the first of `./storefront.yaml`
  /// and `<config dir>/storefront/config.yaml` that exists is read, and
  /// defaults apply when neither does.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    match explicit_path {
      Some(path) if !path.exists() => {
        Err(eyre!("Config file not found: {}", path.display()))
      }
      Some(path) => Self::read(path),
      None => Self::candidate_paths()
        .into_iter()
        .find(|path| path.exists())
        .map_or_else(|| Ok(Self::default()), |path| Self::read(&path)),
    }
  }

  fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("storefront.yaml")];
    paths.extend(dirs::config_dir().map(|dir| dir.join("storefront").join("config.yaml")));
    paths
  }

  fn read(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Cannot read {}: {}", path.display(), e))?;
    Self::from_yaml(&contents).map_err(|e| eyre!("Invalid config {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    url::Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url {:?}: {}", self.api.base_url, e))?;
    if self.api.retry_attempts == 0 {
      return Err(eyre!("api.retry_attempts must be at least 1"));
    }
    if self.api.timeout_ms == 0 {
      return Err(eyre!("api.timeout_ms must be greater than 0"));
    }
    Ok(())
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      attempts: self.api.retry_attempts,
      timeout: Duration::from_millis(self.api.timeout_ms),
      ..RetryPolicy::default()
    }
  }

  pub fn cache_ttl(&self) -> Duration {
    Duration::from_secs(self.cache.ttl_secs)
  }
}

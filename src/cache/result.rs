//! Provenance of values handed out by the cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
  Network,
  /// Cached and younger than the stale time
  CacheFresh,
  /// Cached past the stale time; the refresh failed
  CacheStale,
  /// Built-in data; the refresh failed with nothing cached
  Demo,
}

/// A value plus where it came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// Store time, set only for cached values
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  fn with_source(data: T, source: CacheSource, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source,
      cached_at,
    }
  }

  pub fn from_network(data: T) -> Self {
    Self::with_source(data, CacheSource::Network, None)
  }

  pub fn from_cache(data: T, cached_at: DateTime<Utc>, is_stale: bool) -> Self {
    let source = match is_stale {
      true => CacheSource::CacheStale,
      false => CacheSource::CacheFresh,
    };
    Self::with_source(data, source, Some(cached_at))
  }

  pub fn demo(data: T) -> Self {
    Self::with_source(data, CacheSource::Demo, None)
  }

  /// True when the value is not the outcome of a current, successful fetch.
  pub fn is_degraded(&self) -> bool {
    matches!(self.source, CacheSource::CacheStale | CacheSource::Demo)
  }
}

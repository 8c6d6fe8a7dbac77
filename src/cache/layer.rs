//! Single-slot cache that orchestrates freshness checks with network fetching.

use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::result::CacheResult;

/// Default time before cached data is considered stale.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// A stored value with its timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub data: T,
  /// Wall-clock time of the store, for reporting
  pub cached_at: DateTime<Utc>,
  stored_at: Instant,
}

impl<T> CacheEntry<T> {
  /// Time since the entry was stored.
  pub fn age(&self) -> Duration {
    self.stored_at.elapsed()
  }
}

/// Cache holding at most one value. Each `put` replaces the previous value.
///
/// Concurrent fetches are not coordinated: two callers missing the cache at
/// the same time both go to the network and the last one to finish wins.
pub struct CacheLayer<T> {
  slot: Mutex<Option<CacheEntry<T>>>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl<T: Clone> CacheLayer<T> {
  /// Create an empty cache with the default stale time.
  pub fn new() -> Self {
    Self {
      slot: Mutex::new(None),
      stale_time: DEFAULT_STALE_TIME,
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn stale_time(&self) -> Duration {
    self.stale_time
  }

  fn slot(&self) -> MutexGuard<'_, Option<CacheEntry<T>>> {
    // The slot is only ever replaced wholesale, so a poisoned lock still
    // holds a consistent value.
    self.slot.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_entry_fresh(&self, entry: &CacheEntry<T>) -> bool {
    entry.age() < self.stale_time
  }

  /// The cached value, if it is still fresh.
  pub fn get(&self) -> Option<T> {
    self.fresh_entry().map(|entry| entry.data)
  }

  /// The cached entry, if it is still fresh.
  pub fn fresh_entry(&self) -> Option<CacheEntry<T>> {
    self
      .slot()
      .as_ref()
      .filter(|entry| self.is_entry_fresh(entry))
      .cloned()
  }

  /// The cached value regardless of age.
  pub fn get_stale(&self) -> Option<T> {
    self.stale_entry().map(|entry| entry.data)
  }

  /// The cached entry regardless of age.
  pub fn stale_entry(&self) -> Option<CacheEntry<T>> {
    self.slot().clone()
  }

  /// Store a value, replacing whatever was cached.
  pub fn put(&self, data: T) {
    *self.slot() = Some(CacheEntry {
      data,
      cached_at: Utc::now(),
      stored_at: Instant::now(),
    });
  }

  /// Drop the cached value.
  pub fn clear(&self) {
    *self.slot() = None;
  }

  /// Whether a value is cached and younger than the stale time.
  pub fn is_fresh(&self) -> bool {
    self
      .slot()
      .as_ref()
      .is_some_and(|entry| self.is_entry_fresh(entry))
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Unless `force_refresh`, return a fresh cached value immediately
  /// 2. Otherwise fetch and store the result
  /// 3. On fetch failure, return the cached value at any age
  /// 4. With nothing cached, return the fetch error
  pub async fn fetch<E, F, Fut>(&self, force_refresh: bool, fetcher: F) -> Result<CacheResult<T>, E>
  where
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    if !force_refresh {
      if let Some(entry) = self.fresh_entry() {
        debug!(age_ms = entry.age().as_millis() as u64, "cache hit");
        return Ok(CacheResult::from_cache(entry.data, entry.cached_at, false));
      }
    }

    match fetcher().await {
      Ok(data) => {
        self.put(data.clone());
        Ok(CacheResult::from_network(data))
      }
      Err(err) => match self.stale_entry() {
        Some(entry) => {
          warn!(
            error = %err,
            age_ms = entry.age().as_millis() as u64,
            "fetch failed, serving cached data"
          );
          Ok(CacheResult::from_cache(entry.data, entry.cached_at, true))
        }
        None => Err(err),
      },
    }
  }
}

impl<T: Clone> Default for CacheLayer<T> {
  fn default() -> Self {
    Self::new()
  }
}

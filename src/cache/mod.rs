//! In-memory caching with stale fallback.
//!
//! This module provides a single-slot cache that:
//! - Serves the last stored value while it is younger than the stale time
//! - Falls back to the stored value at any age when a refresh fails
//! - Reports where a value came from so callers can log degraded results

mod layer;
mod result;

pub use layer::{CacheEntry, CacheLayer};
pub use result::{CacheResult, CacheSource};

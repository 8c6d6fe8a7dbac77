//! Product catalog: upstream access, normalization and display filtering.

pub mod api_types;
pub mod client;
pub mod demo;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod service;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{HttpClient, ReqwestTransport, RequestOptions, RetryPolicy, Transport, TransportResponse};
pub use error::{CatalogError, TransportError};
pub use filter::{filter_customizable, is_displayable, search, stats, CatalogStats};
pub use normalize::normalize;
pub use service::{ApiHealth, CatalogService, Endpoints, HealthStatus, ProductCache, WorkerHealth};
pub use types::{Category, FileRecord, ItemId, ProductRecord, VariantRecord};

//! Envelope shapes returned by the upstream products endpoints.
//!
//! The worker, the fulfillment API and older proxies all wrap products
//! differently. Each known shape gets its own decoder; decoders are tried in
//! a fixed order and anything left over is an `InvalidResponseShape`.

use serde_json::{Map, Value};

use super::error::CatalogError;

/// A decoder either claims the value or hands it back untouched.
type Decoder<E> = fn(Value) -> Result<E, Value>;

fn run_decoders<E>(
  mut value: Value,
  decoders: &[Decoder<E>],
  context: &'static str,
) -> Result<E, CatalogError> {
  for decoder in decoders {
    value = match decoder(value) {
      Ok(envelope) => return Ok(envelope),
      Err(value) => value,
    };
  }
  Err(CatalogError::InvalidResponseShape { context })
}

fn has_ok_code(obj: &Map<String, Value>) -> bool {
  obj.get("code").and_then(Value::as_i64) == Some(200)
}

// ============================================================================
// Product list endpoint
// ============================================================================

/// Known shapes of `GET /products`
#[derive(Debug, Clone, PartialEq)]
pub enum ProductListEnvelope {
  /// `{code: 200, result: [...], extra, paging}` as relayed by the worker
  Worker(Vec<Value>),
  /// `{items: [...]}`
  Items(Vec<Value>),
  /// A bare JSON array
  Bare(Vec<Value>),
}

const LIST_DECODERS: &[Decoder<ProductListEnvelope>] =
  &[decode_worker_list, decode_items_list, decode_bare_list];

fn decode_worker_list(value: Value) -> Result<ProductListEnvelope, Value> {
  match value {
    Value::Object(mut obj) if has_ok_code(&obj) && obj.get("result").is_some_and(Value::is_array) => {
      match obj.remove("result") {
        Some(Value::Array(items)) => Ok(ProductListEnvelope::Worker(items)),
        _ => Err(Value::Object(obj)),
      }
    }
    other => Err(other),
  }
}

fn decode_items_list(value: Value) -> Result<ProductListEnvelope, Value> {
  match value {
    Value::Object(mut obj) if obj.get("items").is_some_and(Value::is_array) => {
      match obj.remove("items") {
        Some(Value::Array(items)) => Ok(ProductListEnvelope::Items(items)),
        _ => Err(Value::Object(obj)),
      }
    }
    other => Err(other),
  }
}

fn decode_bare_list(value: Value) -> Result<ProductListEnvelope, Value> {
  match value {
    Value::Array(items) => Ok(ProductListEnvelope::Bare(items)),
    other => Err(other),
  }
}

impl ProductListEnvelope {
  pub fn decode(value: Value) -> Result<Self, CatalogError> {
    run_decoders(value, LIST_DECODERS, "product list")
  }

  pub fn shape(&self) -> &'static str {
    match self {
      Self::Worker(_) => "worker",
      Self::Items(_) => "items",
      Self::Bare(_) => "bare",
    }
  }

  pub fn into_products(self) -> Vec<Value> {
    match self {
      Self::Worker(items) | Self::Items(items) | Self::Bare(items) => items,
    }
  }
}

/// True when the payload is the worker envelope carrying an array result.
pub fn has_worker_data(value: &Value) -> bool {
  value
    .as_object()
    .is_some_and(|obj| has_ok_code(obj) && obj.get("result").is_some_and(Value::is_array))
}

// ============================================================================
// Single product endpoint
// ============================================================================

/// Known shapes of `GET /products/{id}`
#[derive(Debug, Clone, PartialEq)]
pub enum ProductDetailEnvelope {
  /// `{code: 200, result: {sync_product, sync_variants}}`
  Synced {
    product: Map<String, Value>,
    variants: Vec<Value>,
  },
  /// `{result: {...}}`
  Result(Map<String, Value>),
  /// `{item: {...}}`
  Item(Map<String, Value>),
  /// `{code: 200, ...product fields}`
  Direct(Map<String, Value>),
}

const DETAIL_DECODERS: &[Decoder<ProductDetailEnvelope>] = &[
  decode_synced_detail,
  decode_result_detail,
  decode_item_detail,
  decode_direct_detail,
];

fn decode_synced_detail(value: Value) -> Result<ProductDetailEnvelope, Value> {
  let matches = value.as_object().is_some_and(|obj| {
    has_ok_code(obj)
      && obj
        .get("result")
        .and_then(|r| r.get("sync_product"))
        .is_some_and(Value::is_object)
  });
  if !matches {
    return Err(value);
  }

  let mut obj = match value {
    Value::Object(obj) => obj,
    other => return Err(other),
  };
  let mut result = match obj.remove("result") {
    Some(Value::Object(result)) => result,
    _ => return Err(Value::Object(obj)),
  };
  let product = match result.remove("sync_product") {
    Some(Value::Object(product)) => product,
    _ => Map::new(),
  };
  let variants = match result.remove("sync_variants") {
    Some(Value::Array(variants)) => variants,
    _ => Vec::new(),
  };
  Ok(ProductDetailEnvelope::Synced { product, variants })
}

fn take_object_field(value: Value, field: &str) -> Result<Map<String, Value>, Value> {
  match value {
    Value::Object(mut obj) if obj.get(field).is_some_and(Value::is_object) => {
      match obj.remove(field) {
        Some(Value::Object(inner)) => Ok(inner),
        _ => Err(Value::Object(obj)),
      }
    }
    other => Err(other),
  }
}

fn decode_result_detail(value: Value) -> Result<ProductDetailEnvelope, Value> {
  take_object_field(value, "result").map(ProductDetailEnvelope::Result)
}

fn decode_item_detail(value: Value) -> Result<ProductDetailEnvelope, Value> {
  take_object_field(value, "item").map(ProductDetailEnvelope::Item)
}

fn decode_direct_detail(value: Value) -> Result<ProductDetailEnvelope, Value> {
  match value {
    Value::Object(obj) if has_ok_code(&obj) => Ok(ProductDetailEnvelope::Direct(obj)),
    other => Err(other),
  }
}

impl ProductDetailEnvelope {
  pub fn decode(value: Value) -> Result<Self, CatalogError> {
    run_decoders(value, DETAIL_DECODERS, "product detail")
  }

  /// Flatten into one raw product object the normalizer understands.
  /// Synced variants are attached under `sync_variants`.
  pub fn into_raw_product(self) -> Value {
    match self {
      Self::Synced {
        mut product,
        variants,
      } => {
        product.insert("sync_variants".to_string(), Value::Array(variants));
        Value::Object(product)
      }
      Self::Result(product) | Self::Item(product) | Self::Direct(product) => {
        Value::Object(product)
      }
    }
  }
}

//! Display eligibility and search over normalized products.

use serde::Serialize;
use std::collections::BTreeMap;

use super::types::ProductRecord;

/// Substrings of a type or name that mark a customizable product.
const CUSTOMIZABLE_TYPES: &[&str] = &[
  "t-shirt",
  "tshirt",
  "t shirt",
  "tee",
  "hoodie",
  "hood",
  "sweatshirt",
  "sweater",
  "cap",
  "hat",
  "beanie",
  "headwear",
  "mug",
  "cup",
  "coffee",
  "traveler",
  "bag",
  "backpack",
  "tote",
  "purse",
  "accessory",
];

/// Description phrases for region-locked products (matched lowercased).
const GEO_RESTRICTIONS: &[&str] = &[
  "only available in",
  "disponibles solo en",
  "exclusivamente en",
  "restricted to",
];

/// Title markers for placeholder listings (matched case-sensitively).
const SAMPLE_MARKERS: &[&str] = &["Sample", "Mockup", "Blank", "Test"];

fn is_customizable_type(product: &ProductRecord) -> bool {
  let type_name = product.type_name.to_lowercase();
  let name = product.name.to_lowercase();
  CUSTOMIZABLE_TYPES
    .iter()
    .any(|t| type_name.contains(t) || name.contains(t))
}

fn has_geo_restriction(product: &ProductRecord) -> bool {
  let description = product.description.to_lowercase();
  GEO_RESTRICTIONS.iter().any(|p| description.contains(p))
}

fn is_sample(product: &ProductRecord) -> bool {
  SAMPLE_MARKERS.iter().any(|m| product.title.contains(m))
}

/// Whether a product should be shown in the storefront.
pub fn is_displayable(product: &ProductRecord) -> bool {
  product.available
    && (product.variant_count > 0 || is_customizable_type(product))
    && !has_geo_restriction(product)
    && !is_sample(product)
}

/// Keep displayable products, preserving order.
pub fn filter_customizable(products: Vec<ProductRecord>) -> Vec<ProductRecord> {
  products.into_iter().filter(is_displayable).collect()
}

/// Case-insensitive search over name, description and type name.
/// A blank term returns everything.
pub fn search<'a>(products: &'a [ProductRecord], term: &str) -> Vec<&'a ProductRecord> {
  let term = term.trim().to_lowercase();
  if term.is_empty() {
    return products.iter().collect();
  }

  products
    .iter()
    .filter(|p| {
      p.name.to_lowercase().contains(&term)
        || p.description.to_lowercase().contains(&term)
        || p.type_name.to_lowercase().contains(&term)
    })
    .collect()
}

/// Aggregate figures over a product list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
  pub total: usize,
  pub by_type: BTreeMap<String, usize>,
  pub total_variants: u64,
  pub total_synced: u64,
  /// Mean variants per product, rounded to one decimal
  pub average_variants: f64,
  /// Synced variants as a percentage of all variants
  pub sync_rate: u32,
}

pub fn stats(products: &[ProductRecord]) -> CatalogStats {
  let mut by_type = BTreeMap::new();
  let mut total_variants = 0;
  let mut total_synced = 0;

  for product in products {
    let key = if product.type_name.is_empty() {
      "Other".to_string()
    } else {
      product.type_name.clone()
    };
    *by_type.entry(key).or_insert(0) += 1;
    total_variants += product.variant_count;
    total_synced += product.synced_count;
  }

  let average_variants = if products.is_empty() {
    0.0
  } else {
    (total_variants as f64 / products.len() as f64 * 10.0).round() / 10.0
  };
  let sync_rate = if total_variants == 0 {
    0
  } else {
    (total_synced as f64 / total_variants as f64 * 100.0).round() as u32
  };

  CatalogStats {
    total: products.len(),
    by_type,
    total_variants,
    total_synced,
    average_variants,
    sync_rate,
  }
}

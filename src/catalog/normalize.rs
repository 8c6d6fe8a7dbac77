//! Normalization of raw upstream products into [`ProductRecord`].
//!
//! Every field is resolved by an ordered list of extractors; the first one
//! that yields a non-empty value wins. Normalization never fails: anything
//! missing falls back to a default, and non-object input produces a record
//! made entirely of defaults.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use super::types::{Category, FileRecord, ItemId, ProductRecord, VariantRecord};

const DEFAULT_PRODUCT_NAME: &str = "Custom Product";

/// Borrowed view over a raw product object.
#[derive(Clone, Copy)]
struct RawProduct<'a> {
  fields: Option<&'a Map<String, Value>>,
}

impl<'a> RawProduct<'a> {
  fn new(value: &'a Value) -> Self {
    Self {
      fields: value.as_object(),
    }
  }

  fn get(&self, key: &str) -> Option<&'a Value> {
    self.fields.and_then(|f| f.get(key)).filter(|v| !v.is_null())
  }

  /// Non-empty string field
  fn text(&self, key: &str) -> Option<&'a str> {
    self.get(key).and_then(non_empty_str)
  }

  fn array(&self, key: &str) -> Option<&'a Vec<Value>> {
    self.get(key).and_then(Value::as_array)
  }

  /// Product-level files: the top-level `files` list if there is one,
  /// otherwise every variant's files in order. Only the first file seen
  /// for each id is kept; files without an id share one slot.
  fn files(&self) -> Vec<&'a Value> {
    let candidates: Vec<&'a Value> = match self.array("files") {
      Some(files) => files.iter().collect(),
      None => self
        .array("sync_variants")
        .into_iter()
        .flatten()
        .filter_map(|variant| variant.get("files").and_then(Value::as_array))
        .flatten()
        .collect(),
    };

    let mut seen = HashSet::new();
    candidates
      .into_iter()
      .filter(|file| seen.insert(file.get("id").and_then(ItemId::from_json)))
      .collect()
  }
}

type Extractor<T> = fn(&RawProduct<'_>) -> Option<T>;

fn first_match<T>(raw: &RawProduct<'_>, extractors: &[Extractor<T>]) -> Option<T> {
  extractors.iter().find_map(|extract| extract(raw))
}

fn non_empty_str(value: &Value) -> Option<&str> {
  value.as_str().filter(|s| !s.is_empty())
}

fn text_of(value: &Value, key: &str) -> Option<String> {
  value.get(key).and_then(non_empty_str).map(String::from)
}

/// Scalar rendered as text; numbers keep their JSON spelling.
fn scalar_text(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Non-negative count from a number or numeric string.
fn count_of(value: &Value) -> Option<u64> {
  match value {
    Value::Number(n) => n
      .as_u64()
      .or_else(|| n.as_f64().map(|f| if f > 0.0 { f as u64 } else { 0 })),
    Value::String(s) => s.trim().parse::<u64>().ok(),
    _ => None,
  }
}

// ============================================================================
// Thumbnail
// ============================================================================

const THUMBNAIL_EXTRACTORS: &[Extractor<String>] = &[
  thumbnail_from_field,
  thumbnail_from_thumbnails,
  thumbnail_from_image,
  thumbnail_from_images,
  thumbnail_from_preview_file,
  thumbnail_from_first_file,
];

fn thumbnail_from_field(raw: &RawProduct<'_>) -> Option<String> {
  raw.text("thumbnail_url").map(String::from)
}

fn thumbnail_from_thumbnails(raw: &RawProduct<'_>) -> Option<String> {
  raw.array("thumbnails")?.first().and_then(|t| text_of(t, "url"))
}

fn thumbnail_from_image(raw: &RawProduct<'_>) -> Option<String> {
  raw.text("image").map(String::from)
}

fn thumbnail_from_images(raw: &RawProduct<'_>) -> Option<String> {
  raw
    .array("images")?
    .first()
    .and_then(non_empty_str)
    .map(String::from)
}

fn thumbnail_from_preview_file(raw: &RawProduct<'_>) -> Option<String> {
  raw
    .files()
    .into_iter()
    .filter(|f| f.get("type").and_then(Value::as_str) == Some("preview"))
    .find_map(|f| text_of(f, "preview_url"))
}

fn thumbnail_from_first_file(raw: &RawProduct<'_>) -> Option<String> {
  let files = raw.files();
  let first = files.first()?;
  text_of(first, "url").or_else(|| text_of(first, "thumbnail_url"))
}

// ============================================================================
// Description
// ============================================================================

/// Falls back to the product title when none of these match, so a
/// normalized record always carries a description.
const DESCRIPTION_EXTRACTORS: &[Extractor<String>] = &[
  description_from_field,
  description_from_title,
  description_from_type,
];

fn description_from_field(raw: &RawProduct<'_>) -> Option<String> {
  raw.text("description").map(String::from)
}

fn description_from_title(raw: &RawProduct<'_>) -> Option<String> {
  raw.text("title").map(String::from)
}

fn description_from_type(raw: &RawProduct<'_>) -> Option<String> {
  raw.text("type_name").map(|type_name| {
    format!(
      "High-quality {} with customizable design",
      type_name.to_lowercase()
    )
  })
}

// ============================================================================
// Variant count
// ============================================================================

const VARIANT_COUNT_EXTRACTORS: &[Extractor<u64>] = &[
  variants_from_number,
  variants_from_list,
  variants_from_count_field,
  variants_from_sync_variants,
];

fn variants_from_number(raw: &RawProduct<'_>) -> Option<u64> {
  raw.get("variants").and_then(count_of)
}

/// Detail payloads sometimes carry the variant list itself under `variants`.
fn variants_from_list(raw: &RawProduct<'_>) -> Option<u64> {
  raw
    .array("variants")
    .filter(|v| !v.is_empty())
    .map(|v| v.len() as u64)
}

fn variants_from_count_field(raw: &RawProduct<'_>) -> Option<u64> {
  raw.get("variant_count").and_then(count_of)
}

fn variants_from_sync_variants(raw: &RawProduct<'_>) -> Option<u64> {
  raw.array("sync_variants").map(|v| v.len() as u64)
}

// ============================================================================
// Classification
// ============================================================================

/// Product type keyword table. Rows are checked in order.
const PRODUCT_TYPES: &[(&[&str], &str)] = &[
  (&["t-shirt", "tshirt", "tee"], "T-Shirt"),
  (&["hoodie", "hood", "sweatshirt"], "Hoodie"),
  (&["cap", "hat", "beanie"], "Cap"),
  (&["mug", "cup", "coffee"], "Mug"),
  (&["bag", "backpack", "tote"], "Accessory"),
];

const DEFAULT_PRODUCT_TYPE: &str = "Product";

/// Storefront category keyword table. Rows are checked in order.
const CATEGORIES: &[(&[&str], Category)] = &[
  (&["t-shirt", "tshirt", "hoodie", "sudadera"], Category::Ropa),
  (&["mug", "taza"], Category::Hogar),
  (&["cap", "gorra", "hat"], Category::Accesorios),
  (&["poster", "póster"], Category::Arte),
];

fn keyword_lookup<T: Copy>(table: &[(&[&str], T)], text: &str) -> Option<T> {
  let text = text.to_lowercase();
  table
    .iter()
    .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
    .map(|(_, value)| *value)
}

/// Derive a product type name from a product name.
pub fn product_type_for(name: &str) -> &'static str {
  keyword_lookup(PRODUCT_TYPES, name).unwrap_or(DEFAULT_PRODUCT_TYPE)
}

/// Derive the storefront category, trying the name before the type name.
pub fn category_for(name: &str, type_name: &str) -> Category {
  keyword_lookup(CATEGORIES, name)
    .or_else(|| keyword_lookup(CATEGORIES, type_name))
    .unwrap_or(Category::General)
}

// ============================================================================
// Variants and files
// ============================================================================

fn normalize_file(value: &Value) -> FileRecord {
  FileRecord {
    id: value.get("id").and_then(ItemId::from_json),
    file_type: text_of(value, "type"),
    url: text_of(value, "url"),
    preview_url: text_of(value, "preview_url"),
    thumbnail_url: text_of(value, "thumbnail_url"),
    filename: text_of(value, "filename"),
  }
}

fn normalize_files(values: &[Value]) -> Vec<FileRecord> {
  values.iter().map(normalize_file).collect()
}

fn normalize_variant(value: &Value) -> VariantRecord {
  VariantRecord {
    id: value.get("id").and_then(ItemId::from_json),
    name: text_of(value, "name"),
    size: text_of(value, "size"),
    color: text_of(value, "color"),
    price: scalar_text(value.get("retail_price")),
    currency: text_of(value, "currency"),
    sku: text_of(value, "sku"),
    availability_status: text_of(value, "availability_status"),
    files: value
      .get("files")
      .and_then(Value::as_array)
      .map(|files| normalize_files(files))
      .unwrap_or_default(),
  }
}

// ============================================================================
// Entry point
// ============================================================================

/// Stable identifier for a product that arrived without one.
fn generated_id(raw: &Value) -> ItemId {
  let bytes = serde_json::to_vec(raw).unwrap_or_default();
  let digest = hex::encode(Sha256::digest(&bytes));
  ItemId::Text(format!("demo-{}", &digest[..9]))
}

fn availability(raw: &RawProduct<'_>) -> bool {
  match raw.get("available") {
    None => true,
    Some(Value::Bool(b)) => *b,
    Some(Value::Number(n)) => n.as_f64() == Some(1.0),
    Some(_) => false,
  }
}

/// Normalize one raw upstream product.
pub fn normalize(value: &Value) -> ProductRecord {
  let raw = RawProduct::new(value);

  let name = raw
    .text("name")
    .or_else(|| raw.text("title"))
    .unwrap_or(DEFAULT_PRODUCT_NAME)
    .to_string();
  let title = raw
    .text("title")
    .or_else(|| raw.text("name"))
    .unwrap_or(DEFAULT_PRODUCT_NAME)
    .to_string();

  let type_name = raw
    .text("type_name")
    .map(String::from)
    .unwrap_or_else(|| product_type_for(&name).to_string());
  let category = category_for(&name, &type_name);

  let variant_count = first_match(&raw, VARIANT_COUNT_EXTRACTORS).unwrap_or(0);
  let synced_count = raw
    .get("synced")
    .and_then(count_of)
    .filter(|n| *n > 0)
    .unwrap_or(variant_count);

  let variants: Vec<VariantRecord> = raw
    .array("sync_variants")
    .map(|vs| vs.iter().map(normalize_variant).collect())
    .unwrap_or_default();

  let files: Vec<FileRecord> = raw.files().into_iter().map(normalize_file).collect();

  let gallery_images = raw
    .array("gallery_images")
    .or_else(|| raw.array("images"))
    .map(|images| {
      images
        .iter()
        .filter_map(non_empty_str)
        .map(String::from)
        .collect()
    })
    .unwrap_or_default();

  ProductRecord {
    id: raw
      .get("id")
      .and_then(ItemId::from_json)
      .unwrap_or_else(|| generated_id(value)),
    external_id: scalar_text(raw.get("external_id")),
    description: first_match(&raw, DESCRIPTION_EXTRACTORS).unwrap_or_else(|| title.clone()),
    thumbnail_url: first_match(&raw, THUMBNAIL_EXTRACTORS).unwrap_or_default(),
    name,
    title,
    variant_count,
    synced_count,
    type_name,
    is_customizable: true,
    category,
    available: availability(&raw),
    is_ignored: raw.get("is_ignored").and_then(Value::as_bool).unwrap_or(false),
    gallery_images,
    created_at: scalar_text(raw.get("created_at")),
    updated_at: scalar_text(raw.get("updated_at")),
    variants,
    files,
  }
}

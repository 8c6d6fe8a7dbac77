use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier as the upstream sends it: numeric for synced items, text for
/// external or generated ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
  Number(i64),
  Text(String),
}

impl ItemId {
  /// Parse an id from a raw JSON value. Empty strings, zero, null and
  /// non-scalar values are treated as absent.
  pub fn from_json(value: &serde_json::Value) -> Option<Self> {
    match value {
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(0) => None,
        Some(i) => Some(ItemId::Number(i)),
        None if n.as_f64() == Some(0.0) => None,
        None => Some(ItemId::Text(n.to_string())),
      },
      serde_json::Value::String(s) if !s.is_empty() => Some(ItemId::Text(s.clone())),
      _ => None,
    }
  }
}

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ItemId::Number(n) => write!(f, "{}", n),
      ItemId::Text(s) => f.write_str(s),
    }
  }
}

impl From<&str> for ItemId {
  fn from(s: &str) -> Self {
    match s.parse::<i64>() {
      Ok(n) if n != 0 => ItemId::Number(n),
      _ => ItemId::Text(s.to_string()),
    }
  }
}

/// Coarse storefront category used by the filtering UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
  Ropa,
  Hogar,
  Accesorios,
  Arte,
  General,
}

impl Category {
  pub const ALL: [Category; 5] = [
    Category::Ropa,
    Category::Hogar,
    Category::Accesorios,
    Category::Arte,
    Category::General,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Ropa => "Ropa",
      Category::Hogar => "Hogar",
      Category::Accesorios => "Accesorios",
      Category::Arte => "Arte",
      Category::General => "General",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A print file attached to a product or variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
  pub id: Option<ItemId>,
  #[serde(rename = "type")]
  pub file_type: Option<String>,
  pub url: Option<String>,
  pub preview_url: Option<String>,
  pub thumbnail_url: Option<String>,
  pub filename: Option<String>,
}

/// A sellable variant (size/color combination)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
  pub id: Option<ItemId>,
  pub name: Option<String>,
  pub size: Option<String>,
  pub color: Option<String>,
  /// Retail price as a decimal string, e.g. "12.50"
  pub price: Option<String>,
  pub currency: Option<String>,
  pub sku: Option<String>,
  pub availability_status: Option<String>,
  pub files: Vec<FileRecord>,
}

/// Canonical product record produced by the normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
  pub id: ItemId,
  pub external_id: Option<String>,
  pub name: String,
  pub title: String,
  pub description: String,
  pub thumbnail_url: String,
  pub variant_count: u64,
  pub synced_count: u64,
  pub type_name: String,
  pub is_customizable: bool,
  pub category: Category,
  pub available: bool,
  pub is_ignored: bool,
  pub gallery_images: Vec<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  pub variants: Vec<VariantRecord>,
  pub files: Vec<FileRecord>,
}

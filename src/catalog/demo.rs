//! Built-in catalog served when the API is unreachable and nothing is cached.

use serde_json::{json, Value};

use super::api_types::ProductDetailEnvelope;
use super::normalize::normalize;
use super::types::ProductRecord;

/// Id of the built-in detailed product.
pub const DEMO_DETAIL_ID: &str = "395276124";

const DEMO_THUMBNAIL: &str = "catalogo/remeras/remera_20_celestial.png";

fn demo_catalog_raw() -> Value {
  json!([
    {
      "id": "demo-1",
      "name": "Premium T-Shirt - Classic Black",
      "description": "Comfortable cotton t-shirt with premium quality print. Perfect for everyday wear.",
      "variants": 24,
      "synced": 24,
      "thumbnail_url": DEMO_THUMBNAIL,
      "type_name": "T-Shirt"
    },
    {
      "id": "demo-2",
      "name": "Stylish Hoodie - Navy Blue",
      "description": "Warm and cozy hoodie with kangaroo pocket and adjustable hood.",
      "variants": 18,
      "synced": 18,
      "thumbnail_url": "catalogo/sudaderas/sudadera_03_all_over_neon.png",
      "type_name": "Hoodie"
    },
    {
      "id": "demo-3",
      "name": "Sport Cap - Adjustable",
      "description": "Classic baseball cap with adjustable strap and breathable fabric.",
      "variants": 12,
      "synced": 12,
      "thumbnail_url": "catalogo/gorras/gorra_07_sport.png",
      "type_name": "Cap"
    },
    {
      "id": "demo-4",
      "name": "Ceramic Mug - Large Size",
      "description": "High-quality ceramic mug perfect for hot and cold beverages.",
      "variants": 8,
      "synced": 8,
      "thumbnail_url": "catalogo/tazas/taza_17_extra.png",
      "type_name": "Mug"
    },
    {
      "id": "demo-5",
      "name": "Leather Accessories Set",
      "description": "Premium leather wallet, card holder, and key organizer set.",
      "variants": 6,
      "synced": 6,
      "thumbnail_url": "catalogo/accessories/minimalist_leather_fashion_accessories_flat_lay_mockup.jpg",
      "type_name": "Accessory"
    }
  ])
}

fn demo_detail_raw() -> Value {
  json!({
    "code": 200,
    "result": {
      "sync_product": {
        "id": 395276124,
        "external_id": "68e298ecaacd32",
        "name": "T-SHIRT – Soft, Stylish & Available in Many Colors",
        "variants": 48,
        "synced": 48,
        "thumbnail_url": "https://files.cdn.printful.com/files/551/55149dcc5007ef6fa3ef1c886261da9a_preview.png",
        "is_ignored": false
      },
      "sync_variants": [
        {
          "id": 5_000_294_874_i64,
          "external_id": "68e298ecaacdd7",
          "sync_product_id": 395276124,
          "name": "T-SHIRT – Soft, Stylish & Available in Many Colors / Black / S",
          "synced": true,
          "variant_id": 11546,
          "retail_price": "12.50",
          "sku": "68E298ECA8C1D_Black-S",
          "currency": "USD",
          "files": [
            {
              "id": 645303933,
              "type": "default",
              "url": null,
              "filename": "Sin-ttulo-1-Recuperado.png",
              "thumbnail_url": "https://files.cdn.printful.com/files/121/121c96308596973b74c68c0edf46e23e_thumb.png",
              "preview_url": "https://files.cdn.printful.com/files/121/121c96308596973b74c68c0edf46e23e_preview.png"
            },
            {
              "id": 882873322,
              "type": "preview",
              "url": null,
              "filename": "unisex-classic-tee-black-front-68e298e7a7520.jpg",
              "thumbnail_url": "https://files.cdn.printful.com/files/551/55149dcc5007ef6fa3ef1c886261da9a_thumb.png",
              "preview_url": "https://files.cdn.printful.com/files/551/55149dcc5007ef6fa3ef1c886261da9a_preview.png"
            }
          ],
          "size": "S",
          "color": "Black",
          "availability_status": "active"
        }
      ]
    }
  })
}

/// The fixed demo product list, normalized but not filtered.
pub fn demo_catalog() -> Vec<ProductRecord> {
  match demo_catalog_raw() {
    Value::Array(items) => items.iter().map(normalize).collect(),
    _ => Vec::new(),
  }
}

/// Demo detail record for `product_id`.
///
/// The built-in detailed product is returned for its own id; any other id
/// gets a generic placeholder carrying that id.
pub fn demo_product(product_id: &str) -> ProductRecord {
  if product_id == DEMO_DETAIL_ID {
    if let Ok(envelope) = ProductDetailEnvelope::decode(demo_detail_raw()) {
      return normalize(&envelope.into_raw_product());
    }
  }

  normalize(&json!({
    "id": product_id,
    "name": format!("Demo Product {}", product_id),
    "variants": 12,
    "synced": 12,
    "thumbnail_url": DEMO_THUMBNAIL
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::types::{Category, ItemId};

  #[test]
  fn test_demo_catalog() {
    let products = demo_catalog();
    assert_eq!(products.len(), 5);
    assert_eq!(products[0].id, ItemId::Text("demo-1".to_string()));
    assert_eq!(products[0].category, Category::Ropa);
    assert_eq!(products[3].category, Category::Hogar);
    assert!(products.iter().all(|p| !p.thumbnail_url.is_empty()));
  }

  #[test]
  fn test_demo_detail_product() {
    let product = demo_product(DEMO_DETAIL_ID);
    assert_eq!(product.id, ItemId::Number(395276124));
    assert_eq!(product.variant_count, 48);
    assert_eq!(product.variants.len(), 1);
    assert_eq!(product.variants[0].price.as_deref(), Some("12.50"));
    assert_eq!(product.files.len(), 2);
    assert_eq!(product.external_id.as_deref(), Some("68e298ecaacd32"));
  }

  #[test]
  fn test_generic_demo_product_keeps_requested_id() {
    let product = demo_product("abc");
    assert_eq!(product.id, ItemId::Text("abc".to_string()));
    assert_eq!(product.name, "Demo Product abc");
    assert_eq!(product.variant_count, 12);

    let product = demo_product("77");
    assert_eq!(product.id, ItemId::Text("77".to_string()));
  }
}

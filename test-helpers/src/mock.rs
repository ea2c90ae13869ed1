//! Sample products for tests.

use payloads::{CategoryId, Product, ProductId, Variant};
use serde_json::json;
use uuid::Uuid;

use crate::APP_HOST;

/// A mug with an image and two variants.
pub fn mug() -> Product {
    Product {
        id: ProductId(Uuid::new_v4()),
        image: format!("{APP_HOST}/uploads/mug.png"),
        name: "Enamel mug".into(),
        price: 12,
        stock: 40,
        category_id: kitchen_category(),
        variants: vec![
            Variant(json!({ "name": "Color", "options": ["red", "blue"] })),
            Variant(json!({ "name": "Size", "options": ["S", "L"] })),
        ],
    }
}

/// A product created without an image.
pub fn imageless_poster() -> Product {
    Product {
        id: ProductId(Uuid::new_v4()),
        image: String::new(),
        name: "Poster".into(),
        price: 8,
        stock: 3,
        category_id: CategoryId(Uuid::new_v4()),
        variants: vec![],
    }
}

/// Shared by the fixtures above so tests can tell "kept" from "changed".
pub fn kitchen_category() -> CategoryId {
    CategoryId(Uuid::from_u128(0x6b69_7463_6865_6e00_0000_0000_0000_0001))
}

/// A category other than the kitchen one.
pub fn garden_category() -> CategoryId {
    CategoryId(Uuid::from_u128(0x6761_7264_656e_0000_0000_0000_0000_0002))
}

/// A few bytes that look enough like a PNG for the mock.
pub fn png_bytes() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\nnot really an image".to_vec()
}

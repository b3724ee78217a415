//! Types for the product catalog

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A catalog product as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub brand: String,

    #[serde(default)]
    pub category: String,

    pub price: f64,

    /// Price before discount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(default)]
    pub stock: u32,

    /// Free-form specification table, e.g. `"RAM" -> "16 GB"`
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First image, used as the thumbnail
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Discount relative to `original_price`, in whole percent
    pub fn discount_percent(&self) -> Option<u32> {
        match self.original_price {
            Some(original) if original > self.price && original > 0.0 => {
                Some((((original - self.price) / original) * 100.0).round() as u32)
            }
            _ => None,
        }
    }
}

/// `GET /api/products` answers either a bare array or `{ "products": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductList {
    Plain(Vec<Product>),
    Wrapped { products: Vec<Product> },
}

impl From<ProductList> for Vec<Product> {
    fn from(list: ProductList) -> Self {
        match list {
            ProductList::Plain(products) | ProductList::Wrapped { products } => products,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_mongo_style_ids_and_defaults() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Phone",
            "price": 499.0,
            "originalPrice": 599.0,
            "specifications": { "RAM": "8 GB" }
        }))
        .unwrap();
        assert_eq!(product.id, "p1");
        assert_eq!(product.stock, 0);
        assert!(!product.in_stock());
        assert_eq!(product.discount_percent(), Some(17));
        assert_eq!(product.specifications["RAM"], "8 GB");
        assert_eq!(product.primary_image(), None);
    }

    #[test]
    fn product_list_accepts_both_shapes() {
        let plain: ProductList = serde_json::from_value(json!([{ "id": "a", "name": "A", "price": 1.0 }])).unwrap();
        let wrapped: ProductList =
            serde_json::from_value(json!({ "products": [{ "id": "a", "name": "A", "price": 1.0 }] })).unwrap();
        assert_eq!(Vec::<Product>::from(plain).len(), 1);
        assert_eq!(Vec::<Product>::from(wrapped).len(), 1);
    }
}

//! Admin form payloads.
//!
//! Forms hold the raw strings typed into the dashboard. Building a payload
//! trims them, converts numbers and rejects anything that does not parse
//! instead of letting it through as zero.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::Product;
use crate::error::{Error, Result};
use crate::orders::OrderStatus;

/// Raw add/edit product form
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub original_price: String,
    pub stock: String,
    /// One image URL per line or comma separated
    pub images: String,
    /// `key: value` per line
    pub specifications: String,
}

/// Body of `POST /api/products` and `PUT /api/products/:id`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub brand: String,
    pub category: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub stock: u32,
    pub images: Vec<String>,
    pub specifications: BTreeMap<String, String>,
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    Ok(value)
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn positive_price(value: &str, field: &str) -> Result<f64> {
    let price = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| Error::validation(format!("{} must be a number", field)))?;
    if price <= 0.0 {
        return Err(Error::validation(format!("{} must be greater than 0", field)));
    }
    Ok(price)
}

fn parse_stock(value: &str) -> Result<u32> {
    let stock = value
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::validation("Stock must be a whole number"))?;
    if stock < 0 {
        return Err(Error::validation("Stock cannot be negative"));
    }
    u32::try_from(stock).map_err(|_| Error::validation("Stock is too large"))
}

fn parse_images(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_specifications(value: &str) -> Result<BTreeMap<String, String>> {
    let mut specs = BTreeMap::new();
    for line in value.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (key, val) = line
            .split_once(':')
            .ok_or_else(|| Error::validation(format!("Specification `{}` must look like `name: value`", line)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::validation(format!("Specification `{}` has no name", line)));
        }
        specs.insert(key.to_string(), val.trim().to_string());
    }
    Ok(specs)
}

impl ProductForm {
    /// Prefill the edit form from an existing product
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            original_price: product.original_price.map(|p| p.to_string()).unwrap_or_default(),
            stock: product.stock.to_string(),
            images: product.images.join("\n"),
            specifications: product
                .specifications
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Check the form and convert it into a request payload
    pub fn build(&self) -> Result<ProductPayload> {
        let name = required(&self.name, "Name")?;
        let brand = required(&self.brand, "Brand")?;
        let category = required(&self.category, "Category")?;
        let price = positive_price(required(&self.price, "Price")?, "Price")?;
        let stock = parse_stock(required(&self.stock, "Stock")?)?;
        let original_price = match optional(&self.original_price) {
            Some(raw) => Some(positive_price(&raw, "Original price")?),
            None => None,
        };

        Ok(ProductPayload {
            name: name.to_string(),
            description: optional(&self.description),
            brand: brand.to_string(),
            category: category.to_string(),
            price,
            original_price,
            stock,
            images: parse_images(&self.images),
            specifications: parse_specifications(&self.specifications)?,
        })
    }
}

/// Admin order edit form
#[derive(Debug, Clone)]
pub struct OrderEditForm {
    pub status: String,
}

impl OrderEditForm {
    /// The requested status, if the order may move there from `current`
    pub fn build(&self, current: OrderStatus) -> Result<OrderStatus> {
        let next: OrderStatus = required(&self.status, "Status")?.parse()?;
        if !current.can_transition_to(next) {
            return Err(Error::validation(format!(
                "Cannot move an order from {} to {}",
                current, next
            )));
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: "  iPhone 15 ".into(),
            description: "".into(),
            brand: "Apple".into(),
            category: "phones".into(),
            price: "999.00".into(),
            original_price: " ".into(),
            stock: "12".into(),
            images: "a.jpg, b.jpg\n\nc.jpg".into(),
            specifications: "Storage: 128 GB\nColor:  Black \n".into(),
        }
    }

    #[test]
    fn builds_trimmed_payload() {
        let payload = form().build().unwrap();
        assert_eq!(payload.name, "iPhone 15");
        assert_eq!(payload.description, None);
        assert_eq!(payload.price, 999.0);
        assert_eq!(payload.original_price, None);
        assert_eq!(payload.stock, 12);
        assert_eq!(payload.images, vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(payload.specifications["Color"], "Black");
    }

    #[test]
    fn rejects_invalid_numbers() {
        let cases = [
            ("price", "abc", "Price must be a number"),
            ("price", "0", "Price must be greater than 0"),
            ("price", "-5", "Price must be greater than 0"),
            ("price", "NaN", "Price must be a number"),
            ("stock", "-1", "Stock cannot be negative"),
            ("stock", "2.5", "Stock must be a whole number"),
            ("original_price", "free", "Original price must be a number"),
        ];
        for (field, value, message) in cases {
            let mut f = form();
            match field {
                "price" => f.price = value.into(),
                "stock" => f.stock = value.into(),
                _ => f.original_price = value.into(),
            }
            match f.build() {
                Err(Error::Validation(msg)) => assert_eq!(msg, message, "{}={}", field, value),
                other => panic!("expected validation error for {}={}, got {:?}", field, value, other),
            }
        }
    }

    #[test]
    fn zero_stock_is_allowed() {
        let mut f = form();
        f.stock = "0".into();
        assert_eq!(f.build().unwrap().stock, 0);
    }

    #[test]
    fn required_fields() {
        let mut f = form();
        f.brand = "   ".into();
        assert!(matches!(f.build(), Err(Error::Validation(m)) if m == "Brand is required"));
    }

    #[test]
    fn malformed_specification_line() {
        let mut f = form();
        f.specifications = "Weight 200g".into();
        assert!(f.build().is_err());
    }

    #[test]
    fn edit_form_round_trips_a_product() {
        let payload = form().build().unwrap();
        let product = Product {
            id: "p1".into(),
            name: payload.name.clone(),
            description: payload.description.clone(),
            brand: payload.brand.clone(),
            category: payload.category.clone(),
            price: payload.price,
            original_price: payload.original_price,
            images: payload.images.clone(),
            rating: None,
            stock: payload.stock,
            specifications: payload.specifications.clone(),
        };
        assert_eq!(ProductForm::from_product(&product).build().unwrap(), payload);
    }

    #[test]
    fn order_edit_respects_transitions() {
        let form = OrderEditForm { status: "Shipped".into() };
        assert_eq!(form.build(OrderStatus::Processing).unwrap(), OrderStatus::Shipped);
        assert!(form.build(OrderStatus::Pending).is_err());
        assert!(OrderEditForm { status: "lost".into() }.build(OrderStatus::Pending).is_err());
    }
}

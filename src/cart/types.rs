//! Types for the cart

use serde::{Deserialize, Serialize};

use crate::catalog::Product;

/// One cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl CartItem {
    /// A cart line for `product`; the quantity is floored at one
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            image: product.primary_image().unwrap_or_default().to_string(),
            quantity: quantity.max(1),
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Sum of price times quantity
pub fn cart_total(items: &[CartItem]) -> f64 {
    items.iter().map(CartItem::line_total).sum()
}

/// Sum of quantities
pub fn cart_item_count(items: &[CartItem]) -> u32 {
    items.iter().map(|i| i.quantity).sum()
}

/// Where the cart currently stands
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CartState {
    /// Nothing fetched yet
    #[default]
    Unloaded,
    /// A refetch is in flight; `last` holds what was shown before it
    Loading { last: Option<Vec<CartItem>> },
    /// The server's cart as of the latest applied refetch
    Loaded(Vec<CartItem>),
}

impl CartState {
    /// The most recent known items, empty when nothing was ever loaded
    pub fn items(&self) -> &[CartItem] {
        match self {
            CartState::Unloaded | CartState::Loading { last: None } => &[],
            CartState::Loading { last: Some(items) } | CartState::Loaded(items) => items,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, CartState::Loading { .. })
    }
}

/// Result of a cart operation
#[derive(Debug, Clone, PartialEq)]
pub enum CartOutcome {
    /// The operation ran and the cart was refetched
    Synced(Vec<CartItem>),
    /// No session; nothing was sent and the caller should send the user to
    /// the login page
    LoginRequired { redirect_to: &'static str },
}

impl CartOutcome {
    pub fn items(&self) -> &[CartItem] {
        match self {
            CartOutcome::Synced(items) => items,
            CartOutcome::LoginRequired { .. } => &[],
        }
    }

    pub fn is_login_required(&self) -> bool {
        matches!(self, CartOutcome::LoginRequired { .. })
    }
}

/// A cart line as the server reports it; the quantity is not trusted to be
/// positive until it has been reconciled
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartLine {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    pub quantity: i64,
}

impl CartLine {
    /// The cart item, or `None` when the quantity is not a positive `u32`
    pub(crate) fn into_item(self) -> Option<CartItem> {
        let quantity = u32::try_from(self.quantity).ok().filter(|q| *q > 0)?;
        Some(CartItem {
            product_id: self.product_id,
            name: self.name,
            brand: self.brand,
            price: self.price,
            image: self.image,
            quantity,
        })
    }
}

/// `GET /api/cart/:userId` answers a bare array or `{ "items": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CartResponse {
    Plain(Vec<CartLine>),
    Wrapped {
        #[serde(default)]
        items: Vec<CartLine>,
    },
}

impl From<CartResponse> for Vec<CartLine> {
    fn from(response: CartResponse) -> Self {
        match response {
            CartResponse::Plain(items) | CartResponse::Wrapped { items } => items,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuantityUpdate {
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: f64, quantity: u32) -> CartItem {
        CartItem {
            product_id: id.into(),
            name: id.into(),
            brand: String::new(),
            price,
            image: String::new(),
            quantity,
        }
    }

    #[test]
    fn totals() {
        let mut items = vec![item("p1", 100.0, 2)];
        assert_eq!(cart_total(&items), 200.0);
        items.push(item("p2", 50.0, 1));
        assert_eq!(cart_total(&items), 250.0);
        assert_eq!(cart_item_count(&items), 3);
        assert_eq!(cart_total(&[]), 0.0);
    }

    #[test]
    fn state_items() {
        assert!(CartState::Unloaded.items().is_empty());
        let loaded = CartState::Loaded(vec![item("p1", 1.0, 1)]);
        assert_eq!(loaded.items().len(), 1);
        let loading = CartState::Loading { last: Some(vec![item("p1", 1.0, 1)]) };
        assert!(loading.is_loading());
        assert_eq!(loading.items().len(), 1);
    }

    #[test]
    fn cart_response_shapes() {
        let wrapped: CartResponse = serde_json::from_str(
            r#"{"userId":"u1","items":[{"productId":"p1","price":5,"quantity":2}]}"#,
        )
        .unwrap();
        let lines: Vec<CartLine> = wrapped.into();
        assert_eq!(lines[0].quantity, 2);

        let empty: CartResponse = serde_json::from_str(r#"{"userId":"u1"}"#).unwrap();
        assert!(Vec::<CartLine>::from(empty).is_empty());
    }

    #[test]
    fn negative_quantity_still_decodes() {
        let plain: CartResponse = serde_json::from_str(
            r#"[{"productId":"p1","price":5,"quantity":-1},{"productId":"p2","price":3,"quantity":2}]"#,
        )
        .unwrap();
        let items: Vec<CartItem> = Vec::<CartLine>::from(plain)
            .into_iter()
            .filter_map(CartLine::into_item)
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "p2");
    }
}

//! Types for orders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::Address;
use crate::cards::CardBrand;
use crate::cart::CartItem;
use crate::error::Error;

/// Order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Delivered and cancelled orders never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// `pending → processing → shipped → delivered`; cancellation only before
    /// shipping. Staying in the same status is allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Pending, Processing)
                    | (Processing, Shipped)
                    | (Shipped, Delivered)
                    | (Pending, Cancelled)
                    | (Processing, Cancelled)
            )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::validation(format!("Unknown order status `{}`", s)))
    }
}

/// How an order is paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PaymentMethod {
    /// A saved card, referenced by id with display metadata
    Card {
        #[serde(rename = "cardId")]
        card_id: String,
        brand: CardBrand,
        last4: String,
    },
    CashOnDelivery,
}

/// A placed order; only the status changes after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub total: f64,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Body of `POST /api/orders`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub total: f64,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
}

/// What the shopper fills in at checkout
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdate {
    pub status: OrderStatus,
}

/// Order listings come back bare or as `{ "orders": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OrderList {
    Plain(Vec<Order>),
    Wrapped { orders: Vec<Order> },
}

impl From<OrderList> for Vec<Order> {
    fn from(list: OrderList) -> Self {
        match list {
            OrderList::Plain(orders) | OrderList::Wrapped { orders } => orders,
        }
    }
}

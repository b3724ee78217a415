//! Checkout and order history

mod types;

use reqwest::Client;
use tracing::{info, warn};

use crate::auth::SessionContext;
use crate::cart::{cart_total, CartOutcome, CartSync};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{endpoint, Fetch};

pub use types::*;

/// Client for placing and reading orders
pub struct OrdersClient {
    url: String,
    client: Client,
    options: ClientOptions,
    session: SessionContext,
}

impl OrdersClient {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions, session: SessionContext) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            session,
        }
    }

    fn get_url(&self, segments: &[&str]) -> Result<String> {
        let mut path = vec!["api", "orders"];
        path.extend_from_slice(segments);
        endpoint(&self.url, &path)
    }

    /// Place an order from the current cart.
    ///
    /// The cart is refetched first so the order snapshots exactly what the
    /// server holds, and it is cleared once the order is accepted. The order
    /// exists as soon as the server accepts it, so a failed clear is logged
    /// and the order is still returned.
    pub async fn checkout(&self, cart: &CartSync, request: CheckoutRequest) -> Result<Order> {
        let credentials = self.session.require().await?;

        let missing = request.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "Shipping address is missing: {}",
                missing.join(", ")
            )));
        }

        let items = match cart.load().await? {
            CartOutcome::Synced(items) => items,
            CartOutcome::LoginRequired { .. } => return Err(Error::NotAuthenticated),
        };
        if items.is_empty() {
            return Err(Error::validation("Your cart is empty"));
        }

        let body = NewOrder {
            user_id: credentials.user_id.clone(),
            total: cart_total(&items),
            items,
            shipping_address: request.shipping_address,
            payment_method: request.payment_method,
        };

        let url = self.get_url(&[])?;
        let result = Fetch::post(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&body)?
            .execute::<Order>()
            .await;
        let order = self.session.observe(result).await?;

        info!(order_id = %order.id, total = order.total, "order placed");
        if let Err(e) = cart.clear().await {
            warn!(order_id = %order.id, error = %e, "order placed but the cart could not be cleared");
        }
        Ok(order)
    }

    /// Orders of the signed-in user
    pub async fn list_for_user(&self) -> Result<Vec<Order>> {
        let credentials = self.session.require().await?;
        let url = self.get_url(&["user", credentials.user_id.as_str()])?;

        let result = Fetch::get(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute::<OrderList>()
            .await;
        Ok(self.session.observe(result).await?.into())
    }

    /// A single order
    pub async fn get(&self, order_id: &str) -> Result<Order> {
        let credentials = self.session.require().await?;
        let url = self.get_url(&[order_id])?;

        let result = Fetch::get(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute::<Order>()
            .await;
        self.session.observe(result).await.map_err(|e| match e {
            Error::NotFound(_) => Error::not_found(format!("Order {} not found", order_id)),
            other => other,
        })
    }
}

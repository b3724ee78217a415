//! Admin dashboard: statistics, product and order management

mod forms;

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::auth::SessionContext;
use crate::catalog::Product;
use crate::config::ClientOptions;
use crate::error::Result;
use crate::fetch::{endpoint, Fetch};
use crate::orders::{Order, OrderList, OrderStatus, StatusUpdate};

pub use forms::*;

/// Dashboard counters from `GET /api/admin/stats`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminStats {
    pub total_products: u64,
    pub total_orders: u64,
    pub total_users: u64,
    pub total_revenue: f64,
    pub pending_orders: u64,
    pub low_stock_products: u64,
}

/// Client for admin-only endpoints; every call needs an admin session
pub struct AdminClient {
    url: String,
    client: Client,
    options: ClientOptions,
    session: SessionContext,
}

impl AdminClient {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions, session: SessionContext) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            session,
        }
    }

    fn get_url(&self, segments: &[&str]) -> Result<String> {
        let mut path = vec!["api"];
        path.extend_from_slice(segments);
        endpoint(&self.url, &path)
    }

    pub async fn stats(&self) -> Result<AdminStats> {
        let credentials = self.session.require_admin().await?;
        let url = self.get_url(&["admin", "stats"])?;

        let result = Fetch::get(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute::<AdminStats>()
            .await;
        self.session.observe(result).await
    }

    /// Every order in the shop
    pub async fn orders(&self) -> Result<Vec<Order>> {
        let credentials = self.session.require_admin().await?;
        let url = self.get_url(&["admin", "orders"])?;

        let result = Fetch::get(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute::<OrderList>()
            .await;
        Ok(self.session.observe(result).await?.into())
    }

    /// Validate the add-product form and create the product
    pub async fn create_product(&self, form: &ProductForm) -> Result<Product> {
        let payload = form.build()?;
        let credentials = self.session.require_admin().await?;
        let url = self.get_url(&["products"])?;

        let result = Fetch::post(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&payload)?
            .execute::<Product>()
            .await;
        let product = self.session.observe(result).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Validate the edit-product form and update the product
    pub async fn update_product(&self, product_id: &str, form: &ProductForm) -> Result<Product> {
        let payload = form.build()?;
        let credentials = self.session.require_admin().await?;
        let url = self.get_url(&["products", product_id])?;

        let result = Fetch::put(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&payload)?
            .execute::<Product>()
            .await;
        let product = self.session.observe(result).await?;
        info!(product_id = %product.id, "product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<()> {
        let credentials = self.session.require_admin().await?;
        let url = self.get_url(&["products", product_id])?;

        let result = Fetch::delete(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute_empty()
            .await;
        self.session.observe(result).await?;
        info!(product_id = %product_id, "product deleted");
        Ok(())
    }

    /// Set an order's status
    pub async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        let credentials = self.session.require_admin().await?;
        let url = self.get_url(&["orders", order_id, "status"])?;

        let result = Fetch::put(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&StatusUpdate { status })?
            .execute::<Order>()
            .await;
        let order = self.session.observe(result).await?;
        info!(order_id = %order_id, status = %status, "order status updated");
        Ok(order)
    }

    /// Apply the order edit form to `order`, checking the transition first
    pub async fn edit_order(&self, order: &Order, form: &OrderEditForm) -> Result<Order> {
        let next = form.build(order.status)?;
        self.update_order_status(&order.id, next).await
    }
}

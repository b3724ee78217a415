//! Cart synchronizer.
//!
//! The server owns the cart. Every mutation is sent to the cart endpoint and
//! followed by a full refetch whose result replaces the local copy; nothing is
//! applied optimistically.

mod types;

use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::{SessionContext, SessionCredentials};
use crate::catalog::Product;
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{endpoint, Fetch};

pub use types::*;

/// Where an unauthenticated shopper is sent
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Default)]
struct Inner {
    state: CartState,
    // latest ticket applied, by a refetch or a reset
    applied: u64,
}

/// Mirrors the signed-in user's server-side cart
#[derive(Clone)]
pub struct CartSync {
    url: String,
    client: Client,
    options: ClientOptions,
    session: SessionContext,
    inner: Arc<RwLock<Inner>>,
    next_ticket: Arc<AtomicU64>,
}

impl CartSync {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions, session: SessionContext) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            session,
            inner: Arc::new(RwLock::new(Inner::default())),
            next_ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    fn get_url(&self, user_id: &str, product_id: Option<&str>) -> Result<String> {
        match product_id {
            Some(product_id) => endpoint(&self.url, &["api", "cart", user_id, product_id]),
            None => endpoint(&self.url, &["api", "cart", user_id]),
        }
    }

    /// Session credentials, or `None` when the shopper has to log in first
    async fn credentials(&self) -> Result<Option<SessionCredentials>> {
        match self.session.require().await {
            Ok(credentials) => Ok(Some(credentials)),
            Err(Error::NotAuthenticated | Error::SessionExpired) => {
                debug!("cart operation without a session, redirecting to login");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn login_required() -> CartOutcome {
        CartOutcome::LoginRequired { redirect_to: LOGIN_PATH }
    }

    /// Fetch the cart and replace the local state
    pub async fn load(&self) -> Result<CartOutcome> {
        let Some(credentials) = self.credentials().await? else {
            return Ok(Self::login_required());
        };
        self.refetch(&credentials).await.map(CartOutcome::Synced)
    }

    /// Add a line; the quantity is floored at one
    pub async fn add(&self, mut item: CartItem) -> Result<CartOutcome> {
        let Some(credentials) = self.credentials().await? else {
            return Ok(Self::login_required());
        };
        item.quantity = item.quantity.max(1);

        let url = self.get_url(&credentials.user_id, None)?;
        let result = Fetch::post(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&item)?
            .execute_empty()
            .await;
        self.observe(result).await?;

        self.refetch(&credentials).await.map(CartOutcome::Synced)
    }

    /// Add `quantity` of a catalog product
    pub async fn add_product(&self, product: &Product, quantity: u32) -> Result<CartOutcome> {
        self.add(CartItem::from_product(product, quantity)).await
    }

    /// Set the quantity of a line; anything below one removes it
    pub async fn update_quantity(&self, product_id: &str, quantity: i64) -> Result<CartOutcome> {
        if quantity < 1 {
            return self.remove(product_id).await;
        }
        let Some(credentials) = self.credentials().await? else {
            return Ok(Self::login_required());
        };
        let quantity = u32::try_from(quantity)
            .map_err(|_| Error::validation(format!("Quantity {} is too large", quantity)))?;

        let url = self.get_url(&credentials.user_id, Some(product_id))?;
        let result = Fetch::post(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&QuantityUpdate { quantity })?
            .execute_empty()
            .await;
        self.observe(result).await?;

        self.refetch(&credentials).await.map(CartOutcome::Synced)
    }

    /// Step a line up by one
    pub async fn increment(&self, product_id: &str) -> Result<CartOutcome> {
        let current = self.quantity_of(product_id).await;
        self.update_quantity(product_id, i64::from(current) + 1).await
    }

    /// Step a line down by one; stepping below one removes the line
    pub async fn decrement(&self, product_id: &str) -> Result<CartOutcome> {
        let current = self.quantity_of(product_id).await;
        self.update_quantity(product_id, i64::from(current) - 1).await
    }

    /// Remove a line
    pub async fn remove(&self, product_id: &str) -> Result<CartOutcome> {
        let Some(credentials) = self.credentials().await? else {
            return Ok(Self::login_required());
        };

        let url = self.get_url(&credentials.user_id, Some(product_id))?;
        let result = Fetch::delete(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute_empty()
            .await;
        self.observe(result).await?;

        self.refetch(&credentials).await.map(CartOutcome::Synced)
    }

    /// Empty the cart
    pub async fn clear(&self) -> Result<CartOutcome> {
        let Some(credentials) = self.credentials().await? else {
            return Ok(Self::login_required());
        };

        let url = self.get_url(&credentials.user_id, None)?;
        let result = Fetch::delete(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute_empty()
            .await;
        self.observe(result).await?;

        self.refetch(&credentials).await.map(CartOutcome::Synced)
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> CartState {
        self.inner.read().await.state.clone()
    }

    /// Most recent known items
    pub async fn items(&self) -> Vec<CartItem> {
        self.inner.read().await.state.items().to_vec()
    }

    pub async fn total(&self) -> f64 {
        cart_total(self.inner.read().await.state.items())
    }

    pub async fn item_count(&self) -> u32 {
        cart_item_count(self.inner.read().await.state.items())
    }

    /// Forget the local copy, e.g. after logout.
    ///
    /// Takes a ticket of its own, so refetches still in flight land as stale.
    pub async fn reset(&self) {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let mut inner = self.inner.write().await;
        inner.state = CartState::Unloaded;
        inner.applied = inner.applied.max(ticket);
    }

    /// Pass a response through the session; a rejected token also drops the
    /// cart, since it belonged to the session that just ended
    async fn observe<T>(&self, result: Result<T>) -> Result<T> {
        let result = self.session.observe(result).await;
        if let Err(Error::Unauthorized) = &result {
            self.reset().await;
        }
        result
    }

    async fn quantity_of(&self, product_id: &str) -> u32 {
        self.inner
            .read()
            .await
            .state
            .items()
            .iter()
            .find(|i| i.product_id == product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Fetch the full cart and make it the local state.
    ///
    /// Refetches are ticketed; a response older than the one already shown is
    /// dropped instead of overwriting newer data.
    async fn refetch(&self, credentials: &SessionCredentials) -> Result<Vec<CartItem>> {
        let url = self.get_url(&credentials.user_id, None)?;
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut inner = self.inner.write().await;
            let last = match std::mem::take(&mut inner.state) {
                CartState::Unloaded => None,
                CartState::Loading { last } => last,
                CartState::Loaded(items) => Some(items),
            };
            inner.state = CartState::Loading { last };
        }

        let result = Fetch::get(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute::<CartResponse>()
            .await;
        let result = self.observe(result).await;

        let mut inner = self.inner.write().await;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if let CartState::Loading { last } = &mut inner.state {
                    let last = last.take();
                    inner.state = last.map(CartState::Loaded).unwrap_or_default();
                }
                return Err(e);
            }
        };

        let items = reconcile(response.into());
        if ticket <= inner.applied {
            warn!(ticket, applied = inner.applied, "discarding stale cart refetch");
            return Ok(inner.state.items().to_vec());
        }

        inner.applied = ticket;
        inner.state = CartState::Loaded(items.clone());
        Ok(items)
    }
}

/// Drop lines the server reports with a non-positive quantity
fn reconcile(lines: Vec<CartLine>) -> Vec<CartItem> {
    lines
        .into_iter()
        .filter_map(|line| {
            let (product_id, quantity) = (line.product_id.clone(), line.quantity);
            let item = line.into_item();
            if item.is_none() {
                warn!(product_id = %product_id, quantity, "dropping cart line with invalid quantity");
            }
            item
        })
        .collect()
}

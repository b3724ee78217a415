//! Product catalog: fetching and in-memory filtering

mod filter;
mod types;

use reqwest::Client;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{endpoint, Fetch};

pub use filter::*;
pub use types::*;

/// Client for the product catalog.
///
/// The full product list is fetched once and kept in memory; clones of the
/// client share that cache.
#[derive(Clone)]
pub struct CatalogClient {
    url: String,
    client: Client,
    options: ClientOptions,
    cache: Arc<RwLock<Option<Arc<Vec<Product>>>>>,
}

impl CatalogClient {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    fn get_url(&self, segments: &[&str]) -> Result<String> {
        let mut path = vec!["api", "products"];
        path.extend_from_slice(segments);
        endpoint(&self.url, &path)
    }

    /// Server-side product search
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let url = self.get_url(&[])?;
        let products = Fetch::get(&self.client, &url)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .query(filter.to_query_pairs())
            .execute::<ProductList>()
            .await?;
        Ok(products.into())
    }

    /// Fetch a single product
    pub async fn get(&self, id: &str) -> Result<Product> {
        let url = self.get_url(&[id])?;
        Fetch::get(&self.client, &url)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute::<Product>()
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::not_found(format!("Product {} not found", id)),
                other => other,
            })
    }

    /// Fetch the catalog unless it is already cached
    pub async fn load(&self) -> Result<Arc<Vec<Product>>> {
        if let Some(products) = self.cache.read().await.as_ref() {
            return Ok(Arc::clone(products));
        }
        self.reload().await
    }

    /// Fetch the catalog, replacing the cache
    pub async fn reload(&self) -> Result<Arc<Vec<Product>>> {
        let products = Arc::new(self.list(&ProductFilter::default()).await?);
        debug!(count = products.len(), "catalog loaded");
        *self.cache.write().await = Some(Arc::clone(&products));
        Ok(products)
    }

    /// Filter the cached catalog, loading it first if needed
    pub async fn filter(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let products = self.load().await?;
        Ok(filter.apply(&products))
    }

    /// Distinct brands of the cached catalog, sorted
    pub async fn brands(&self) -> Result<Vec<String>> {
        let products = self.load().await?;
        Ok(distinct(products.iter().map(|p| p.brand.as_str())))
    }

    /// Distinct categories of the cached catalog, sorted
    pub async fn categories(&self) -> Result<Vec<String>> {
        let products = self.load().await?;
        Ok(distinct(products.iter().map(|p| p.category.as_str())))
    }

    /// Lowest and highest price in the cached catalog
    pub async fn price_bounds(&self) -> Result<Option<(f64, f64)>> {
        let products = self.load().await?;
        Ok(products.iter().fold(None, |bounds, p| match bounds {
            None => Some((p.price, p.price)),
            Some((lo, hi)) => Some((lo.min(p.price), hi.max(p.price))),
        }))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

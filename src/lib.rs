//! Storefront Rust Client Library
//!
//! A Rust client for the storefront REST API: catalog browsing and filtering,
//! a server-reconciled cart, sessions, checkout and order history, saved
//! cards, the admin dashboard and the shopping assistant.

pub mod admin;
pub mod auth;
pub mod cards;
pub mod cart;
pub mod catalog;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod fetch;
pub mod orders;
pub mod query;
pub mod users;

use reqwest::Client;
use std::sync::Arc;

use crate::admin::AdminClient;
use crate::auth::{Auth, FileStorage, MemoryStorage, SessionContext, SessionStorage};
use crate::cards::CardsClient;
use crate::cart::CartSync;
use crate::catalog::CatalogClient;
use crate::chatbot::ChatbotClient;
use crate::config::{ClientOptions, StorefrontConfig};
use crate::error::Result;
use crate::orders::OrdersClient;
use crate::users::UsersClient;

/// The main entry point for the storefront client
pub struct Storefront {
    /// The API root, without trailing slash
    pub url: String,
    /// HTTP client shared by every sub-client
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    session: SessionContext,
    catalog: CatalogClient,
    cart: CartSync,
    chatbot: ChatbotClient,
}

impl Storefront {
    /// Create a new client for the API at `url`
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_client::Storefront;
    ///
    /// let shop = Storefront::new("http://localhost:5000").unwrap();
    /// assert!(!shop.auth().is_authenticated());
    /// ```
    pub fn new(url: &str) -> Result<Self> {
        Self::from_config(StorefrontConfig::new(url)?)
    }

    /// Create a client from environment variables, see [`StorefrontConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::from_config(StorefrontConfig::from_env()?)
    }

    /// Create a client from a configuration. Sessions go to the configured
    /// file, or stay in memory when there is none.
    pub fn from_config(config: StorefrontConfig) -> Result<Self> {
        let storage: Arc<dyn SessionStorage> = match &config.session_file {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(config, storage)
    }

    /// Create a client with a custom session storage backend
    pub fn with_storage(config: StorefrontConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let http_client = Client::builder().build()?;
        let url = config.api_root();
        let options = config.options;
        let session = SessionContext::new(storage, options.persist_session);

        let catalog = CatalogClient::new(&url, http_client.clone(), options.clone());
        let cart = CartSync::new(&url, http_client.clone(), options.clone(), session.clone());
        let chatbot = ChatbotClient::new(&url, http_client.clone(), options.clone());

        Ok(Self {
            url,
            http_client,
            options,
            session,
            catalog,
            cart,
            chatbot,
        })
    }

    /// The shared session context
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Client for sign-in, registration and password flows
    pub fn auth(&self) -> Auth {
        Auth::new(&self.url, self.http_client.clone(), self.session.clone(), self.options.clone())
    }

    /// The catalog client; its product cache is shared
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// The cart synchronizer for the current session
    pub fn cart(&self) -> &CartSync {
        &self.cart
    }

    pub fn orders(&self) -> OrdersClient {
        OrdersClient::new(&self.url, self.http_client.clone(), self.options.clone(), self.session.clone())
    }

    pub fn users(&self) -> UsersClient {
        UsersClient::new(&self.url, self.http_client.clone(), self.options.clone(), self.session.clone())
    }

    pub fn cards(&self) -> CardsClient {
        CardsClient::new(self.session.clone())
    }

    pub fn admin(&self) -> AdminClient {
        AdminClient::new(&self.url, self.http_client.clone(), self.options.clone(), self.session.clone())
    }

    /// The chatbot client; its transcript is shared
    pub fn chatbot(&self) -> &ChatbotClient {
        &self.chatbot
    }

    /// Log out and forget everything tied to the previous user
    pub async fn sign_out(&self) -> Result<()> {
        self.auth().logout().await?;
        self.cart.reset().await;
        self.chatbot.reset();
        Ok(())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::Storefront;
    pub use crate::catalog::{Product, ProductFilter};
    pub use crate::cart::{CartItem, CartOutcome};
    pub use crate::config::{ClientOptions, StorefrontConfig};
    pub use crate::error::{Error, Result};
    pub use crate::query::{FilterBinder, FilterParams};
}

//! Configuration options for the storefront client

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Configuration options for the storefront client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Whether sessions are written to the session storage
    pub persist_session: bool,

    /// Session lifetime used when the token carries no `exp` claim
    pub session_ttl: Duration,

    /// The user agent sent with every request
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            persist_session: true,
            session_ttl: Duration::from_secs(60 * 60 * 24),
            user_agent: format!("storefront-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the fallback session lifetime
    pub fn with_session_ttl(mut self, value: Duration) -> Self {
        self.session_ttl = value;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, value: &str) -> Self {
        self.user_agent = value.to_string();
        self
    }
}

/// Where the storefront API lives and how to talk to it.
///
/// There is exactly one base URL; every endpoint is resolved against it.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub base_url: Url,
    pub options: ClientOptions,
    /// File used to persist the session, if any
    pub session_file: Option<PathBuf>,
}

impl StorefrontConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url: &str) -> Result<Self> {
        let base_url = Url::parse(url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "unsupported scheme `{}` in base URL",
                base_url.scheme()
            )));
        }
        Ok(Self {
            base_url,
            options: ClientOptions::default(),
            session_file: None,
        })
    }

    /// Reads `STOREFRONT_API_URL`, `STOREFRONT_REQUEST_TIMEOUT_SECS` and
    /// `STOREFRONT_SESSION_FILE`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&url)?;

        if let Ok(secs) = std::env::var("STOREFRONT_REQUEST_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                Error::config("STOREFRONT_REQUEST_TIMEOUT_SECS must be a whole number of seconds")
            })?;
            config.options = config
                .options
                .with_request_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }

        config.session_file = std::env::var("STOREFRONT_SESSION_FILE").ok().map(PathBuf::from);
        Ok(config)
    }

    /// Replace the client options
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Persist sessions to the given file
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Base URL as a string without a trailing slash
    pub fn api_root(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }
}

//! Authentication and session management for the storefront

mod session;
mod storage;
mod types;

use reqwest::Client;
use tracing::info;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

pub use session::*;
pub use storage::*;
pub use types::*;

/// Client for sign-in, registration and password flows
pub struct Auth {
    /// The API root, without trailing slash
    url: String,

    /// HTTP client used for requests
    client: Client,

    /// The shared session
    session: SessionContext,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, client: Client, session: SessionContext, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            session,
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/api/auth{}", self.url, path)
    }

    /// Sign in with email and password, storing the resulting session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.get_auth_url("/login");
        let body = LoginRequest { email: email.trim(), password };

        let response = Fetch::post(&self.client, &url)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&body)?
            .execute::<AuthResponse>()
            .await
            .map_err(|e| match e {
                Error::Unauthorized | Error::Api { status: 400, .. } => {
                    Error::InvalidCredentials("Invalid email or password".to_string())
                }
                other => other,
            })?;

        info!(user_id = %response.user.id, "user logged in");
        self.store(response).await
    }

    /// Register a new account; the new user is signed in right away
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(Error::validation("Name, email and password are required"));
        }

        let url = self.get_auth_url("/register");
        let body = RegisterRequest { name, email, password };

        let response = Fetch::post(&self.client, &url)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&body)?
            .execute::<AuthResponse>()
            .await
            .map_err(|e| match e {
                Error::Conflict(msg) if msg.is_empty() => {
                    Error::Conflict("Email already registered".to_string())
                }
                other => other,
            })?;

        info!(user_id = %response.user.id, "user registered");
        self.store(response).await
    }

    /// Sign out; the session only lives on this side, so no request is made
    pub async fn logout(&self) -> Result<()> {
        if let Some(session) = self.session.get() {
            info!(user_id = %session.user.id, "user logged out");
        }
        self.session.clear().await
    }

    /// Ask the server to start a password reset for `email`
    pub async fn forgot_password(&self, email: &str) -> Result<String> {
        let url = self.get_auth_url("/forgot-password");
        let body = ForgotPasswordRequest { email: email.trim() };

        let response = Fetch::post(&self.client, &url)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&body)?
            .execute::<MessageResponse>()
            .await?;

        Ok(response.message)
    }

    /// Set a new password for `email`
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<String> {
        if new_password.is_empty() {
            return Err(Error::validation("New password is required"));
        }

        let url = self.get_auth_url("/reset-password");
        let body = ResetPasswordRequest { email: email.trim(), new_password };

        let response = Fetch::post(&self.client, &url)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&body)?
            .execute::<MessageResponse>()
            .await?;

        Ok(response.message)
    }

    /// Reload a persisted session, if one is stored and still valid
    pub async fn restore(&self) -> Result<Option<Session>> {
        self.session.restore().await
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.session.get()
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    async fn store(&self, response: AuthResponse) -> Result<Session> {
        let session = Session::new(response.user, response.token, self.options.session_ttl);
        self.session.set(session.clone()).await?;
        Ok(session)
    }
}

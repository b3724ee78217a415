//! Error handling for the storefront client

use std::fmt;
use thiserror::Error;

/// Unified error type for the storefront client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT decoding errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Session storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Any other non-success status returned by the API
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request conflicts with existing state, e.g. a duplicate email
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Wrong email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The server rejected the bearer token
    #[error("Unauthorized, please login again")]
    Unauthorized,

    /// The session does not carry the admin role
    #[error("Forbidden")]
    Forbidden,

    /// No session is present
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session token is past its expiry
    #[error("Session expired, please login again")]
    SessionExpired,

    /// Client-side validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Map a non-success HTTP status and its body message to an error
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Error::Unauthorized,
            403 => Error::Forbidden,
            404 => Error::NotFound(message),
            409 => Error::Conflict(message),
            _ => Error::Api { status, message },
        }
    }

    /// Whether the error means the caller has to sign in again
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized | Error::NotAuthenticated | Error::SessionExpired
        )
    }

    /// A line suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Error::Http(_) => "Could not reach the server, please try again".to_string(),
            Error::Json(_) => "The server sent an unexpected response".to_string(),
            Error::NotFound(msg)
            | Error::Conflict(msg)
            | Error::InvalidCredentials(msg)
            | Error::Validation(msg) => msg.clone(),
            Error::Api { message, .. } if !message.is_empty() => message.clone(),
            Error::Unauthorized | Error::SessionExpired | Error::NotAuthenticated => {
                "Please login again".to_string()
            }
            Error::Forbidden => "You do not have access to this page".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

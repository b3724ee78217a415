//! Session management for authentication

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::storage::SessionStorage;
use crate::auth::types::{Role, User};
use crate::error::{Error, Result};

/// Storage key holding the `{user, token}` blob
pub const SESSION_KEY: &str = "user";

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The signed-in user
    pub user: User,

    /// The bearer token
    pub token: String,

    /// When the token stops being accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

impl Session {
    /// Create a new session, reading the expiry from the token when it is a
    /// JWT and falling back to `ttl` from now otherwise.
    pub fn new(user: User, token: String, ttl: Duration) -> Self {
        let expires_at = match token_expiry(&token) {
            Ok(Some(at)) => Some(at),
            Ok(None) => fallback_expiry(ttl),
            Err(e) => {
                debug!(error = %e, "token is not a readable JWT, using configured session ttl");
                fallback_expiry(ttl)
            }
        };

        Self { user, token, expires_at }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

/// Read the `exp` claim without verifying the signature; the server is the
/// one that verifies tokens.
pub fn token_expiry(token: &str) -> Result<Option<DateTime<Utc>>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data
        .claims
        .exp
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single()))
}

fn fallback_expiry(ttl: Duration) -> Option<DateTime<Utc>> {
    ChronoDuration::from_std(ttl).ok().map(|ttl| Utc::now() + ttl)
}

/// What an authenticated request needs from the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub user_id: String,
    pub token: String,
    pub role: Role,
}

/// The single session shared by every sub-client.
///
/// Holds the in-memory session and mirrors it into [`SessionStorage`].
#[derive(Clone)]
pub struct SessionContext {
    current: Arc<RwLock<Option<Session>>>,
    storage: Arc<dyn SessionStorage>,
    persist: bool,
}

impl SessionContext {
    pub fn new(storage: Arc<dyn SessionStorage>, persist: bool) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            storage,
            persist,
        }
    }

    /// The storage backend, also used for saved cards
    pub fn storage(&self) -> Arc<dyn SessionStorage> {
        Arc::clone(&self.storage)
    }

    /// Get the current session, expired or not
    pub fn get(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The signed-in user if the session is still valid
    pub fn user(&self) -> Option<User> {
        self.get().filter(|s| !s.is_expired()).map(|s| s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().map(|u| u.is_admin()).unwrap_or(false)
    }

    /// Credentials for an authenticated call.
    ///
    /// An expired session is cleared on the way out.
    pub async fn require(&self) -> Result<SessionCredentials> {
        let session = self.get().ok_or(Error::NotAuthenticated)?;
        if session.is_expired() {
            warn!(user_id = %session.user.id, "session expired, clearing it");
            self.clear().await?;
            return Err(Error::SessionExpired);
        }
        Ok(SessionCredentials {
            user_id: session.user.id,
            token: session.token,
            role: session.user.role,
        })
    }

    /// Like [`require`](Self::require) but also demands the admin role
    pub async fn require_admin(&self) -> Result<SessionCredentials> {
        let credentials = self.require().await?;
        if credentials.role != Role::Admin {
            return Err(Error::Forbidden);
        }
        Ok(credentials)
    }

    /// Replace the session and persist it
    pub async fn set(&self, session: Session) -> Result<()> {
        if self.persist {
            let blob = serde_json::to_string(&session)?;
            self.storage.set_item(SESSION_KEY, &blob).await?;
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    /// Swap the user inside the current session, keeping the token
    pub async fn update_user(&self, user: User) -> Result<()> {
        match self.get() {
            Some(mut session) if session.user.id == user.id => {
                session.user = user;
                self.set(session).await
            }
            _ => Ok(()),
        }
    }

    /// Drop the session from memory and storage
    pub async fn clear(&self) -> Result<()> {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.storage.remove_item(SESSION_KEY).await
    }

    /// Load a persisted session, discarding it when expired or unreadable
    pub async fn restore(&self) -> Result<Option<Session>> {
        let Some(blob) = self.storage.get_item(SESSION_KEY).await? else {
            return Ok(None);
        };

        let session = match serde_json::from_str::<Session>(&blob) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "discarding unreadable persisted session");
                self.storage.remove_item(SESSION_KEY).await?;
                return Ok(None);
            }
        };

        if session.is_expired() {
            warn!(user_id = %session.user.id, "persisted session expired");
            self.storage.remove_item(SESSION_KEY).await?;
            return Ok(None);
        }

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(Some(session))
    }

    /// Pass a result through, clearing the session when the server rejected
    /// the token.
    ///
    /// The rejection is returned even when clearing the stored copy fails.
    pub async fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(Error::Unauthorized) = &result {
            warn!("server rejected the session token");
            if let Err(e) = self.clear().await {
                warn!(error = %e, "could not remove the stored session");
            }
        }
        result
    }
}

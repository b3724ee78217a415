//! User records and profile management

use reqwest::Client;
use serde::Serialize;

use crate::auth::{Address, SessionContext, User};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{endpoint, Fetch};

/// Fields accepted by `PUT /api/users/profile`; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.new_password.is_none()
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::validation("Nothing to update"));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::validation("Name cannot be empty"));
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(Error::validation("Email address is invalid"));
            }
        }
        if self.new_password.is_some() && self.current_password.is_none() {
            return Err(Error::validation("Current password is required to set a new one"));
        }
        Ok(())
    }
}

/// Client for user records
pub struct UsersClient {
    url: String,
    client: Client,
    options: ClientOptions,
    session: SessionContext,
}

impl UsersClient {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions, session: SessionContext) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            session,
        }
    }

    fn get_url(&self, segment: &str) -> Result<String> {
        endpoint(&self.url, &["api", "users", segment])
    }

    /// Fetch a user by id
    pub async fn get(&self, user_id: &str) -> Result<User> {
        let credentials = self.session.require().await?;
        let url = self.get_url(user_id)?;

        let result = Fetch::get(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .execute::<User>()
            .await;
        self.session.observe(result).await
    }

    /// Update a user by id
    pub async fn update(&self, user_id: &str, update: &ProfileUpdate) -> Result<User> {
        update.validate()?;
        let credentials = self.session.require().await?;
        let url = self.get_url(user_id)?;

        let result = Fetch::put(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(update)?
            .execute::<User>()
            .await;
        let user = self.session.observe(result).await?;
        self.session.update_user(user.clone()).await?;
        Ok(user)
    }

    /// Update the signed-in user's own profile and refresh the session copy
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        update.validate()?;
        let credentials = self.session.require().await?;
        let url = self.get_url("profile")?;

        let result = Fetch::put(&self.client, &url)
            .bearer_auth(&credentials.token)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(update)?
            .execute::<User>()
            .await;
        let user = self.session.observe(result).await?;
        self.session.update_user(user.clone()).await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_validation() {
        assert!(ProfileUpdate::default().validate().is_err());

        let rename = ProfileUpdate { name: Some("Grace".into()), ..Default::default() };
        assert!(rename.validate().is_ok());

        let blank = ProfileUpdate { name: Some(" ".into()), ..Default::default() };
        assert!(blank.validate().is_err());

        let password = ProfileUpdate { new_password: Some("n3w".into()), ..Default::default() };
        assert!(password.validate().is_err());
    }

    #[test]
    fn profile_update_skips_absent_fields() {
        let update = ProfileUpdate { phone: Some("555".into()), ..Default::default() };
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({ "phone": "555" }));
    }
}

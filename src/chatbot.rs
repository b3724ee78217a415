//! Shopping assistant chat, proxied to the backend NLU service

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::catalog::Product;
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

/// Reply of `POST /api/chatbot/message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
    /// Products suggested along with a bot reply
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Client for the chatbot widget; keeps the running transcript
#[derive(Clone)]
pub struct ChatbotClient {
    url: String,
    client: Client,
    options: ClientOptions,
    history: Arc<Mutex<Vec<ChatMessage>>>,
}

impl ChatbotClient {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Send a message and record both sides of the exchange
    pub async fn send(&self, message: &str) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::validation("Message cannot be empty"));
        }

        let url = format!("{}/api/chatbot/message", self.url);
        let reply = Fetch::post(&self.client, &url)
            .header("User-Agent", &self.options.user_agent)
            .timeout(self.options.request_timeout)
            .json(&ChatRequest { message })?
            .execute::<ChatReply>()
            .await?;
        debug!(intent = ?reply.intent, "chatbot replied");

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(ChatMessage {
            speaker: Speaker::User,
            text: message.to_string(),
            products: Vec::new(),
        });
        history.push(ChatMessage {
            speaker: Speaker::Bot,
            text: reply.text.clone(),
            products: reply.products.clone().unwrap_or_default(),
        });

        Ok(reply)
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// Provider-specific request shaping and client configuration.
// Some providers reject plain-string user content and require the typed
// parts representation instead; the adapter here rewrites messages on the
// way out without touching the caller's list.

use crate::client::ChatClient;
use crate::http::HttpTransport;
use crate::types::{Content, Message};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Providers whose chat endpoint requires parts-based user content.
const PART_CONTENT_PROVIDERS: [&str; 2] = ["google", "gemini"];

/// Whether user-turn content must be sent in parts form.
///
/// Decision is by normalized provider name when one is given, with a
/// model-name substring heuristic as fallback.
pub fn needs_part_content(provider: Option<&str>, model: &str) -> bool {
    if let Some(provider) = provider {
        let normalized = provider.trim().to_ascii_lowercase();
        if !normalized.is_empty() {
            return PART_CONTENT_PROVIDERS.contains(&normalized.as_str());
        }
    }
    model.to_ascii_lowercase().contains("gemini")
}

/// Produce the provider-ready JSON message list.
///
/// When `needs_parts` is set, every user message with plain-text content is
/// rewritten to a single-element text-part list. Messages already in parts
/// form, and non-user messages, pass through unchanged.
pub fn adapt_messages(messages: &[Message], needs_parts: bool) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let adapted = match (needs_parts, message) {
                (true, Message::Human { content: Content::Text(text) }) => {
                    Message::Human {
                        content: Content::text_part(text.clone()),
                    }
                }
                _ => message.clone(),
            };
            serde_json::to_value(adapted).expect("message serialization is infallible")
        })
        .collect()
}

/// Endpoint configuration for an OpenAI-compatible provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,

    /// Provider name hint (e.g. "openai", "gemini"), used for content shaping
    /// and forwarded in the request envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Extra headers applied to every request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra_headers: HashMap<String, String>,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            provider: None,
            extra_headers: HashMap::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Build a [`ChatClient`] backed by an HTTP transport for this endpoint.
    pub fn into_client(self) -> Result<ChatClient> {
        let provider = self.provider.clone();
        let transport = HttpTransport::new(&self)?;
        Ok(ChatClient::new(Arc::new(transport), provider))
    }
}

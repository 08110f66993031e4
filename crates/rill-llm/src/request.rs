//! Canonical outbound request shaping.

use crate::provider::{adapt_messages, needs_part_content};
use crate::tools::normalize_tools;
use crate::types::{Message, Tool, ToolChoice};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chat completion request as the caller sees it.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

/// Sampling parameters, tool configuration and passthrough fields.
///
/// `tools` holds raw caller-supplied records of arbitrary shape; they are
/// normalized when the envelope is built.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub reasoning_effort: Option<String>,
    pub tools: Vec<Value>,
    pub tool_choice: Option<ToolChoice>,
    pub conversation_id: Option<String>,
    pub history_message_limit: Option<u32>,
    pub history_message_order: Option<String>,
    /// Per-request provider hint, overrides the client-level one.
    pub provider: Option<String>,
    /// Arbitrary extra body fields, flattened into the envelope.
    pub extra: Map<String, Value>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn reasoning_effort(mut self, effort: impl Into<String>) -> Self {
        self.reasoning_effort = Some(effort.into());
        self
    }

    pub fn tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn history_message_limit(mut self, limit: u32) -> Self {
        self.history_message_limit = Some(limit);
        self
    }

    pub fn history_message_order(mut self, order: impl Into<String>) -> Self {
        self.history_message_order = Some(order.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Canonical outbound payload.
///
/// Invariant: `tool_choice` is serialized only when a non-empty normalized
/// tool list is present; [`build_envelope`] enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub messages: Vec<Value>,
    pub model: String,
    pub stream: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_message_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_message_order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Build the canonical envelope from a request.
///
/// `client_provider` is the client-level provider hint; a per-request hint in
/// the options takes precedence.
pub fn build_envelope(
    request: &ChatRequest,
    client_provider: Option<&str>,
    stream: bool,
) -> RequestEnvelope {
    let options = &request.options;
    let provider = options.provider.as_deref().or(client_provider);

    let needs_parts = needs_part_content(provider, &request.model);
    let messages = adapt_messages(&request.messages, needs_parts);

    let tools = normalize_tools(&options.tools);
    let tool_choice = if tools.is_some() {
        options.tool_choice.clone()
    } else {
        None
    };

    RequestEnvelope {
        messages,
        model: request.model.clone(),
        stream,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        top_p: options.top_p,
        frequency_penalty: options.frequency_penalty,
        presence_penalty: options.presence_penalty,
        reasoning_effort: options.reasoning_effort.clone(),
        tools,
        tool_choice,
        conversation_id: options.conversation_id.clone(),
        history_message_limit: options.history_message_limit,
        history_message_order: options.history_message_order.clone(),
        provider: provider.map(str::to_string),
        extra: options.extra.clone(),
    }
}

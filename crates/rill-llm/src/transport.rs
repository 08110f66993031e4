//! Transport boundary: the seam between the client core and whatever carries
//! bytes to the serving endpoint.

use crate::request::RequestEnvelope;
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Request/response and chunked-iteration calls against a serving endpoint.
///
/// Cancellation is cooperative and lives in the client, not here: the
/// controller stops pulling from the stream once its token is signalled.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Single request/response round trip.
    async fn call(&self, envelope: &RequestEnvelope) -> Result<Value>;

    /// Open a chunked response stream.
    async fn open_stream(&self, envelope: &RequestEnvelope) -> Result<ChunkStream>;

    /// Endpoint liveness probe.
    async fn health_check(&self) -> bool;

    /// Session bootstrap.
    async fn initialize(&self) -> Result<()>;
}

/// One transport chunk.
///
/// Providers disagree on shape: some deliver a bare string token, some a flat
/// `{content}` object, most the OpenAI-style `choices[0].delta` form. All
/// three deserialize into this one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamChunk {
    Raw(String),
    Object(ChunkObject),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl StreamChunk {
    /// Convenience constructor for the flat content shape.
    pub fn content(text: impl Into<String>) -> Self {
        Self::Object(ChunkObject {
            content: Some(text.into()),
            ..ChunkObject::default()
        })
    }

    /// Convenience constructor for a delta-style reasoning chunk.
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Object(ChunkObject {
            reasoning_content: Some(text.into()),
            ..ChunkObject::default()
        })
    }

    /// Visible token carried by this chunk.
    ///
    /// Precedence: raw string, flat `content`, `choices[0].delta.content`.
    pub fn visible_delta(&self) -> Option<&str> {
        match self {
            Self::Raw(s) => Some(s.as_str()),
            Self::Object(obj) => obj
                .content
                .as_deref()
                .or_else(|| obj.choices.first().and_then(|c| c.delta.content.as_deref())),
        }
    }

    /// Reasoning delta carried by this chunk, if any.
    pub fn reasoning_delta(&self) -> Option<&str> {
        match self {
            Self::Raw(_) => None,
            Self::Object(obj) => obj
                .reasoning_content
                .as_deref()
                .or_else(|| {
                    obj.choices
                        .first()
                        .and_then(|c| c.delta.reasoning_content.as_deref())
                })
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn finish_reason(&self) -> Option<&str> {
        match self {
            Self::Raw(_) => None,
            Self::Object(obj) => obj.choices.first().and_then(|c| c.finish_reason.as_deref()),
        }
    }
}

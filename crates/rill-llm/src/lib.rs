//! # rill-llm
//!
//! Streaming chat-completion client with:
//! - token-by-token streaming with reasoning/content separation
//! - cooperative cancellation (single active stream per client)
//! - normalization of duck-typed tool/function schemas
//! - token-budget truncation of conversation history
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use rill_llm::{ChatRequest, Message, ProviderConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ProviderConfig::new("https://api.openai.com/v1", "sk-...")
//!         .into_client()?;
//!
//!     let request = ChatRequest::new("gpt-4o", vec![Message::human("hi")]);
//!     let mut stream = client.chat_stream(request).await?;
//!     while let Some(token) = stream.next().await {
//!         print!("{}", token?);
//!     }
//!     println!("\n---\n{}", stream.persist_text());
//!     Ok(())
//! }
//! ```

pub mod accumulator;
pub mod client;
pub mod http;
pub mod provider;
pub mod request;
pub mod tools;
pub mod transport;
pub mod truncate;
pub mod types;

pub use accumulator::{
    AppendMerge, ReasoningMerge, SnapshotMerge, StreamingAccumulator, REASONING_CLOSE,
};
pub use client::{ChatClient, ChatStream, ChunkObserver, StreamHandle};
pub use http::HttpTransport;
pub use provider::{adapt_messages, needs_part_content, ProviderConfig};
pub use request::{build_envelope, ChatOptions, ChatRequest, RequestEnvelope};
pub use tools::{normalize_tools, sanitize_tool_name};
pub use transport::{ChunkStream, StreamChunk, Transport};
pub use truncate::{estimate_message_tokens, estimate_tokens, truncate_to_budget};
pub use types::{Content, ContentPart, Message, Tool, ToolChoice};

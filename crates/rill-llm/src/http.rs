// HTTP transport over an OpenAI-compatible chat completions endpoint
// (HTTP direct, no SDK).

use crate::provider::ProviderConfig;
use crate::request::RequestEnvelope;
use crate::transport::{ChunkStream, StreamChunk, Transport};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::error;

pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .context("Invalid API key format")?,
        );
        for (name, value) in &config.extra_headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())
                    .with_context(|| format!("Invalid header name: {name}"))?,
                HeaderValue::from_str(value)
                    .with_context(|| format!("Invalid value for header {name}"))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_completions(
        &self,
        envelope: &RequestEnvelope,
    ) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(envelope)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "chat completion request failed");
            anyhow::bail!("API error ({}): {}", status, error_text);
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, envelope: &RequestEnvelope) -> Result<Value> {
        let response = self.post_completions(envelope).await?;
        response.json().await.context("Failed to parse response")
    }

    async fn open_stream(&self, envelope: &RequestEnvelope) -> Result<ChunkStream> {
        let response = self.post_completions(envelope).await?;
        Ok(parse_sse_stream(response))
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/models", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                error!(%err, "health check failed");
                false
            }
        }
    }

    async fn initialize(&self) -> Result<()> {
        if self.health_check().await {
            Ok(())
        } else {
            anyhow::bail!("endpoint is not reachable")
        }
    }
}

/// Parse a server-sent-events body into transport chunks.
fn parse_sse_stream(response: reqwest::Response) -> ChunkStream {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = VecDeque::with_capacity(8192);

        'body: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes);

                    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                        let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();

                        if let Ok(line_str) = std::str::from_utf8(&line_bytes) {
                            let line = line_str.trim();

                            if line.is_empty() {
                                continue;
                            }

                            if let Some(data) = line.strip_prefix("data: ") {
                                if data == "[DONE]" {
                                    break 'body;
                                }

                                match serde_json::from_str::<StreamChunk>(data) {
                                    Ok(chunk) => yield Ok(chunk),
                                    Err(e) => {
                                        yield Err(anyhow::anyhow!("Failed to parse chunk: {}", e));
                                    }
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(%e, "transport stream error");
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                }
            }
        }
    })
}

//! Chat client: the non-streaming sender and the streaming controller.
//!
//! A client instance allows at most one live stream. Starting a new stream
//! cancels and replaces the previous one; cancellation is cooperative and
//! observed at chunk boundaries. The slot holding the active cancellation
//! token is cleared on every exit path, including the caller dropping the
//! stream, so a stale handle can never block a later call.

use crate::accumulator::{ReasoningMerge, StreamingAccumulator};
use crate::request::{build_envelope, ChatRequest};
use crate::transport::{StreamChunk, Transport};
use anyhow::{bail, Result};
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Diagnostic observer invoked with every raw chunk before accumulation.
pub type ChunkObserver = Box<dyn Fn(&StreamChunk) + Send>;

struct ActiveStream {
    generation: u64,
    token: CancellationToken,
}

type ActiveSlot = Arc<Mutex<Option<ActiveStream>>>;

fn clear_slot(slot: &ActiveSlot, generation: u64) {
    let mut guard = slot.lock().expect("active-stream lock poisoned");
    if guard.as_ref().map(|a| a.generation) == Some(generation) {
        *guard = None;
    }
}

/// Clears the active-stream slot when the token stream is dropped, whether it
/// ran to completion, errored, was cancelled or was simply abandoned.
struct SlotGuard {
    slot: ActiveSlot,
    generation: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        clear_slot(&self.slot, self.generation);
    }
}

/// Handle to one in-flight stream.
#[derive(Clone)]
pub struct StreamHandle {
    generation: u64,
    token: CancellationToken,
    slot: ActiveSlot,
}

impl StreamHandle {
    /// Signal cancellation. Idempotent; the stream ends without an error and
    /// emits no further tokens.
    pub fn cancel(&self) {
        self.token.cancel();
        clear_slot(&self.slot, self.generation);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Streaming chat completion in progress.
///
/// Yields visible tokens in transport order. The accumulated buffers are
/// readable at any point and hold the final text once the stream is drained.
pub struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
    accumulator: Arc<Mutex<StreamingAccumulator>>,
    handle: StreamHandle,
}

impl ChatStream {
    pub fn handle(&self) -> StreamHandle {
        self.handle.clone()
    }

    /// Full rendering buffer: reasoning, closing marker, visible content.
    pub fn full_text(&self) -> String {
        self.accumulator
            .lock()
            .expect("accumulator lock poisoned")
            .full_text()
            .to_string()
    }

    /// Buffer intended for persistence.
    pub fn persist_text(&self) -> String {
        self.accumulator
            .lock()
            .expect("accumulator lock poisoned")
            .persist_text()
            .to_string()
    }
}

impl Stream for ChatStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Client for a single chat-completion endpoint.
///
/// Concurrent independent streams require separate client instances; this is
/// a contract, not an oversight.
pub struct ChatClient {
    transport: Arc<dyn Transport>,
    provider: Option<String>,
    reasoning_merge: Arc<dyn ReasoningMerge>,
    active: ActiveSlot,
    next_generation: AtomicU64,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn Transport>, provider: Option<String>) -> Self {
        Self {
            transport,
            provider,
            reasoning_merge: Arc::new(crate::accumulator::AppendMerge),
            active: Arc::new(Mutex::new(None)),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Override the reasoning-delta merge rule (provider-dependent).
    pub fn with_reasoning_merge(mut self, merge: Arc<dyn ReasoningMerge>) -> Self {
        self.reasoning_merge = merge;
        self
    }

    /// Non-streaming chat completion.
    ///
    /// The textual answer is extracted from the first matching response
    /// position; a response with none of them is a shape error, never a
    /// silent empty string.
    pub async fn chat(&self, request: ChatRequest) -> Result<String> {
        let envelope = build_envelope(&request, self.provider.as_deref(), false);
        debug!(model = %envelope.model, "sending chat completion request");
        let response = self.transport.call(&envelope).await?;
        extract_answer(&response)
    }

    /// Streaming chat completion.
    ///
    /// Any previously active stream on this client is cancelled first.
    pub async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream> {
        self.chat_stream_observed(request, None).await
    }

    /// Streaming chat completion with a raw-chunk observer for diagnostics.
    pub async fn chat_stream_observed(
        &self,
        request: ChatRequest,
        observer: Option<ChunkObserver>,
    ) -> Result<ChatStream> {
        let envelope = build_envelope(&request, self.provider.as_deref(), true);

        let token = CancellationToken::new();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut slot = self.active.lock().expect("active-stream lock poisoned");
            if let Some(prev) = slot.take() {
                warn!("replacing active stream, previous stream cancelled");
                prev.token.cancel();
            }
            *slot = Some(ActiveStream {
                generation,
                token: token.clone(),
            });
        }

        debug!(model = %envelope.model, "opening chat completion stream");
        let mut chunks = match self.transport.open_stream(&envelope).await {
            Ok(chunks) => chunks,
            Err(err) => {
                clear_slot(&self.active, generation);
                return Err(err);
            }
        };

        let accumulator = Arc::new(Mutex::new(StreamingAccumulator::new(
            self.reasoning_merge.clone(),
        )));
        let handle = StreamHandle {
            generation,
            token: token.clone(),
            slot: self.active.clone(),
        };

        let guard = SlotGuard {
            slot: self.active.clone(),
            generation,
        };
        let acc = accumulator.clone();

        let tokens = async_stream::stream! {
            let _guard = guard;
            while let Some(item) = chunks.next().await {
                // Cancellation is observed at chunk boundaries: once the
                // token is signalled the sequence ends silently.
                if token.is_cancelled() {
                    debug!("stream cancelled, suppressing further tokens");
                    break;
                }
                match item {
                    Ok(chunk) => {
                        if let Some(observer) = &observer {
                            observer(&chunk);
                        }
                        let text = acc
                            .lock()
                            .expect("accumulator lock poisoned")
                            .push(&chunk);
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                    }
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        };

        Ok(ChatStream {
            inner: Box::pin(tokens),
            accumulator,
            handle,
        })
    }

    /// Cancel the active stream, if any. Idempotent.
    pub fn cancel(&self) {
        let taken = self
            .active
            .lock()
            .expect("active-stream lock poisoned")
            .take();
        if let Some(active) = taken {
            active.token.cancel();
        }
    }

    /// Whether a stream is currently active on this client.
    pub fn has_active_stream(&self) -> bool {
        self.active
            .lock()
            .expect("active-stream lock poisoned")
            .is_some()
    }
}

type AnswerExtractor = fn(&Value) -> Option<String>;

fn answer_from_choices(response: &Value) -> Option<String> {
    response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

fn answer_from_content(response: &Value) -> Option<String> {
    response.get("content")?.as_str().map(str::to_string)
}

fn answer_from_text(response: &Value) -> Option<String> {
    response.get("text")?.as_str().map(str::to_string)
}

/// Ordered extraction strategies for the non-streaming response body.
const ANSWER_EXTRACTORS: [AnswerExtractor; 3] =
    [answer_from_choices, answer_from_content, answer_from_text];

/// Extract the textual answer from a non-streaming response.
pub(crate) fn extract_answer(response: &Value) -> Result<String> {
    for extract in ANSWER_EXTRACTORS {
        if let Some(answer) = extract(response) {
            return Ok(answer);
        }
    }
    bail!("response contains no textual answer in any known position");
}

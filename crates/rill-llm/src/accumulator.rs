//! Accumulation state machine for streamed completions.
//!
//! Consumes transport chunks one at a time and maintains two running buffers:
//! `full_text` (reasoning + closing marker + visible content, for live
//! rendering) and `persist_text` (the buffer intended for storage). Each
//! `push` also returns the visible token extracted from that chunk so callers
//! can render incrementally.

use crate::transport::StreamChunk;
use std::sync::Arc;

/// Closing delimiter appended once when a reasoning block ends.
pub const REASONING_CLOSE: &str = "</think>";

/// Merge rule for successive reasoning deltas.
///
/// Upstream reasoning fields are provider-dependent: some send incremental
/// deltas, some resend a growing snapshot. The rule is injected rather than
/// hard-coded so each variant stays independently testable.
pub trait ReasoningMerge: Send + Sync {
    /// Combine the reasoning text accumulated so far with a new delta.
    fn merge(&self, accumulated: &str, delta: &str) -> String;
}

/// Incremental deltas: each payload is new text to append. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendMerge;

impl ReasoningMerge for AppendMerge {
    fn merge(&self, accumulated: &str, delta: &str) -> String {
        let mut merged = String::with_capacity(accumulated.len() + delta.len());
        merged.push_str(accumulated);
        merged.push_str(delta);
        merged
    }
}

/// Cumulative payloads: each delta restates everything so far. A payload that
/// extends the accumulated text replaces it; an exact resend is suppressed;
/// anything else is appended.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotMerge;

impl ReasoningMerge for SnapshotMerge {
    fn merge(&self, accumulated: &str, delta: &str) -> String {
        if delta.starts_with(accumulated) {
            delta.to_string()
        } else if accumulated.ends_with(delta) {
            accumulated.to_string()
        } else {
            AppendMerge.merge(accumulated, delta)
        }
    }
}

/// Byte offsets of the buffers at reasoning-block entry, kept so a merge rule
/// that rewrites earlier reasoning text can recompose the block.
struct BlockStart {
    full: usize,
    persist: usize,
}

pub struct StreamingAccumulator {
    full_text: String,
    persist_text: String,
    reasoning: String,
    block: Option<BlockStart>,
    merge: Arc<dyn ReasoningMerge>,
}

impl Default for StreamingAccumulator {
    fn default() -> Self {
        Self::new(Arc::new(AppendMerge))
    }
}

impl StreamingAccumulator {
    pub fn new(merge: Arc<dyn ReasoningMerge>) -> Self {
        Self {
            full_text: String::new(),
            persist_text: String::new(),
            reasoning: String::new(),
            block: None,
            merge,
        }
    }

    /// Consume one chunk; returns the visible token it carried (possibly empty).
    pub fn push(&mut self, chunk: &StreamChunk) -> String {
        if let Some(delta) = chunk.reasoning_delta() {
            self.push_reasoning(delta);
        } else if self.block.is_some() {
            // First chunk after reasoning without a reasoning field closes
            // the block. The marker is appended exactly once.
            self.full_text.push_str(REASONING_CLOSE);
            self.persist_text.push_str(REASONING_CLOSE);
            self.block = None;
            self.reasoning.clear();
        }

        let token = chunk.visible_delta().unwrap_or("").to_string();
        if !token.is_empty() {
            self.full_text.push_str(&token);
            self.persist_text.push_str(&token);
        }
        token
    }

    fn push_reasoning(&mut self, delta: &str) {
        if self.block.is_none() {
            self.block = Some(BlockStart {
                full: self.full_text.len(),
                persist: self.persist_text.len(),
            });
            self.reasoning.clear();
        }

        let merged = self.merge.merge(&self.reasoning, delta);
        if let Some(extension) = merged.strip_prefix(self.reasoning.as_str()) {
            self.full_text.push_str(extension);
            self.persist_text.push_str(extension);
        } else if let Some(block) = &self.block {
            // Merge rewrote earlier reasoning text; recompose from block entry.
            let (full_at, persist_at) = (block.full, block.persist);
            self.full_text.truncate(full_at);
            self.persist_text.truncate(persist_at);
            self.full_text.push_str(&merged);
            self.persist_text.push_str(&merged);
        }
        self.reasoning = merged;
    }

    /// `true` between the first reasoning-bearing chunk and the chunk that
    /// closed the block.
    pub fn in_reasoning_block(&self) -> bool {
        self.block.is_some()
    }

    /// Full rendering buffer (reasoning, marker, visible content).
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Buffer intended for persistence.
    pub fn persist_text(&self) -> &str {
        &self.persist_text
    }
}

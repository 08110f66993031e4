//! Token-budget history truncation.
//!
//! Cost is estimated at four characters per token. Selection is greedy from
//! the most recent message backwards and stops at the first message that does
//! not fit; older messages are never considered past that point. The policy
//! is deterministic and intentionally not a knapsack-style optimum.

use crate::types::{Content, Message};

/// Estimated token cost of one message: `ceil(chars / 4)`.
///
/// Character count covers plain text, the concatenation of text parts, or a
/// best-effort serialization of any other content shape.
pub fn estimate_message_tokens(message: &Message) -> usize {
    let chars = match message.content() {
        Content::Text(text) => text.chars().count(),
        content @ Content::Parts(_) => {
            let joined = content.joined_text();
            if joined.is_empty() {
                serde_json::to_string(content)
                    .map(|s| s.chars().count())
                    .unwrap_or(0)
            } else {
                joined.chars().count()
            }
        }
    };
    chars.div_ceil(4)
}

/// Estimated token cost of a message list. Monotonic: concatenating two lists
/// never decreases the estimate.
pub fn estimate_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

/// Select the most recent messages that fit under `budget` tokens.
///
/// With `keep_system_prompt` set and a leading system message, that message
/// is always included and its cost reserved first. The remaining messages are
/// walked newest to oldest; the walk stops at the first message that does not
/// fit. Output preserves chronological order.
pub fn truncate_to_budget(
    messages: &[Message],
    budget: usize,
    keep_system_prompt: bool,
) -> Vec<Message> {
    let mut used = 0usize;
    let mut system: Option<&Message> = None;
    let mut rest = messages;

    if keep_system_prompt {
        if let Some(first) = messages.first() {
            if first.role() == "system" {
                system = Some(first);
                used = estimate_message_tokens(first);
                rest = &messages[1..];
            }
        }
    }

    let mut selected: Vec<&Message> = Vec::new();
    for message in rest.iter().rev() {
        let cost = estimate_message_tokens(message);
        if used + cost > budget {
            break;
        }
        used += cost;
        selected.push(message);
    }
    selected.reverse();

    system
        .into_iter()
        .chain(selected)
        .cloned()
        .collect()
}

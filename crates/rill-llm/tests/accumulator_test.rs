use rill_llm::transport::StreamChunk;
use rill_llm::{AppendMerge, ReasoningMerge, SnapshotMerge, StreamingAccumulator};
use serde_json::json;
use std::sync::Arc;

fn delta_chunk(content: Option<&str>, reasoning: Option<&str>) -> StreamChunk {
    serde_json::from_value(json!({
        "choices": [{"delta": {"content": content, "reasoning_content": reasoning}}]
    }))
    .unwrap()
}

#[test]
fn test_reasoning_then_content() {
    let mut acc = StreamingAccumulator::default();

    assert_eq!(acc.push(&StreamChunk::reasoning("r1")), "");
    assert!(acc.in_reasoning_block());
    assert_eq!(acc.push(&StreamChunk::reasoning("r2")), "");
    assert_eq!(acc.push(&StreamChunk::content("Hello")), "Hello");
    assert!(!acc.in_reasoning_block());

    assert_eq!(acc.persist_text(), "r1r2</think>Hello");
    assert_eq!(acc.full_text(), "r1r2</think>Hello");
    assert_eq!(acc.persist_text().matches("</think>").count(), 1);
}

#[test]
fn test_marker_emitted_once_across_many_content_chunks() {
    let mut acc = StreamingAccumulator::default();
    acc.push(&StreamChunk::reasoning("thinking"));
    acc.push(&StreamChunk::content("a"));
    acc.push(&StreamChunk::content("b"));
    acc.push(&StreamChunk::content("c"));

    assert_eq!(acc.full_text(), "thinking</think>abc");
    assert_eq!(acc.full_text().matches("</think>").count(), 1);
}

#[test]
fn test_empty_chunk_closes_reasoning_block() {
    let mut acc = StreamingAccumulator::default();
    acc.push(&StreamChunk::reasoning("r"));
    // A chunk with neither field still ends the block
    acc.push(&serde_json::from_value(json!({})).unwrap());
    acc.push(&StreamChunk::content("Hi"));

    assert_eq!(acc.persist_text(), "r</think>Hi");
}

#[test]
fn test_no_reasoning_means_no_marker() {
    let mut acc = StreamingAccumulator::default();
    acc.push(&StreamChunk::content("plain"));
    acc.push(&StreamChunk::content(" answer"));

    assert_eq!(acc.full_text(), "plain answer");
    assert!(!acc.full_text().contains("</think>"));
}

#[test]
fn test_delta_shape_reasoning() {
    let mut acc = StreamingAccumulator::default();
    acc.push(&delta_chunk(None, Some("deep ")));
    acc.push(&delta_chunk(None, Some("thought")));
    acc.push(&delta_chunk(Some("42"), None));

    assert_eq!(acc.persist_text(), "deep thought</think>42");
}

#[test]
fn test_raw_string_chunk_is_a_token() {
    let mut acc = StreamingAccumulator::default();
    let chunk: StreamChunk = serde_json::from_value(json!("tok")).unwrap();
    assert_eq!(acc.push(&chunk), "tok");
    assert_eq!(acc.full_text(), "tok");
}

#[test]
fn test_flat_content_takes_precedence_over_choices() {
    let chunk: StreamChunk = serde_json::from_value(json!({
        "content": "flat",
        "choices": [{"delta": {"content": "nested"}}]
    }))
    .unwrap();

    assert_eq!(chunk.visible_delta(), Some("flat"));
}

#[test]
fn test_chunk_without_content_yields_empty_token() {
    let mut acc = StreamingAccumulator::default();
    let chunk: StreamChunk =
        serde_json::from_value(json!({"choices": [{"finish_reason": "stop"}]})).unwrap();
    assert_eq!(acc.push(&chunk), "");
    assert_eq!(chunk.finish_reason(), Some("stop"));
}

#[test]
fn test_append_merge() {
    assert_eq!(AppendMerge.merge("ab", "cd"), "abcd");
    assert_eq!(AppendMerge.merge("", "cd"), "cd");
}

#[test]
fn test_snapshot_merge_replaces_extending_payload() {
    assert_eq!(SnapshotMerge.merge("Think", "Thinking hard"), "Thinking hard");
}

#[test]
fn test_snapshot_merge_suppresses_duplicate_resend() {
    assert_eq!(SnapshotMerge.merge("Thinking", "Thinking"), "Thinking");
    assert_eq!(SnapshotMerge.merge("a Thinking", "Thinking"), "a Thinking");
}

#[test]
fn test_snapshot_merge_appends_unrelated_payload() {
    assert_eq!(SnapshotMerge.merge("first", "second"), "firstsecond");
}

#[test]
fn test_accumulator_with_snapshot_merge() {
    let mut acc = StreamingAccumulator::new(Arc::new(SnapshotMerge));
    acc.push(&StreamChunk::reasoning("Thinking"));
    acc.push(&StreamChunk::reasoning("Thinking about it"));
    acc.push(&StreamChunk::content("done"));

    assert_eq!(acc.persist_text(), "Thinking about it</think>done");
}

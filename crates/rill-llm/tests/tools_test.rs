use rill_llm::tools::{normalize_tools, sanitize_tool_name};
use serde_json::json;

#[test]
fn test_valid_name_passes_through() {
    assert_eq!(
        sanitize_tool_name("get_weather").as_deref(),
        Some("get_weather")
    );
    assert_eq!(sanitize_tool_name("a-b_C9").as_deref(), Some("a-b_C9"));
}

#[test]
fn test_disallowed_runs_collapse_to_underscore() {
    assert_eq!(
        sanitize_tool_name("Weather Lookup!").as_deref(),
        Some("Weather_Lookup")
    );
    assert_eq!(
        sanitize_tool_name("a  ...  b").as_deref(),
        Some("a_b")
    );
}

#[test]
fn test_blank_name_dropped() {
    assert_eq!(sanitize_tool_name("   "), None);
    assert_eq!(sanitize_tool_name(""), None);
    assert_eq!(sanitize_tool_name("!!!"), None);
}

#[test]
fn test_long_name_truncated_to_64() {
    let raw = "x".repeat(100) + "!";
    let sanitized = sanitize_tool_name(&raw).unwrap();
    assert_eq!(sanitized.len(), 64);
    assert!(sanitized.chars().all(|c| c == 'x'));
}

#[test]
fn test_name_resolved_from_function_field() {
    let tools = normalize_tools(&[json!({
        "function": {"name": "lookup", "description": "finds things"}
    })])
    .unwrap();

    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].function.name, "lookup");
    assert_eq!(tools[0].function.description.as_deref(), Some("finds things"));
}

#[test]
fn test_empty_top_level_name_falls_back() {
    let tools = normalize_tools(&[json!({
        "name": "",
        "function": {"name": "fallback"}
    })])
    .unwrap();

    assert_eq!(tools[0].function.name, "fallback");
}

#[test]
fn test_record_without_name_is_dropped() {
    assert!(normalize_tools(&[json!({"description": "nameless"})]).is_none());
}

#[test]
fn test_duplicates_first_wins() {
    let tools = normalize_tools(&[
        json!({"name": "search", "description": "first"}),
        json!({"name": "search", "description": "second"}),
        json!({"name": "search!", "description": "third, sanitizes to a new name"}),
    ])
    .unwrap();

    // "search!" sanitizes to "search" and collides too
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].function.description.as_deref(), Some("first"));
}

#[test]
fn test_schema_location_precedence() {
    let tools = normalize_tools(&[json!({
        "name": "t",
        "function": {"parameters": {"type": "object", "properties": {"a": {}}}},
        "parameters": {"type": "object", "properties": {"b": {}}},
        "input_schema": {"type": "object"}
    })])
    .unwrap();

    assert!(tools[0].function.parameters["properties"]
        .get("a")
        .is_some());
}

#[test]
fn test_non_object_schema_skipped() {
    let tools = normalize_tools(&[json!({
        "name": "t",
        "parameters": "not a schema",
        "input_schema": {"type": "object", "properties": {"city": {"type": "string"}}}
    })])
    .unwrap();

    assert!(tools[0].function.parameters["properties"]
        .get("city")
        .is_some());
}

#[test]
fn test_missing_schema_defaults_to_empty_object() {
    let tools = normalize_tools(&[json!({"name": "bare"})]).unwrap();

    assert_eq!(
        tools[0].function.parameters,
        json!({"type": "object", "properties": {}})
    );
}

#[test]
fn test_empty_input_yields_none() {
    assert!(normalize_tools(&[]).is_none());
    // All records unsalvageable
    assert!(normalize_tools(&[json!({"name": "???"}), json!({})]).is_none());
}

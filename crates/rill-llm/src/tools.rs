//! Canonicalization of caller-supplied tool/function definitions.
//!
//! Callers hand over tool records in whatever shape their upstream source
//! produced: `name` at the top level or nested under `function`, the schema
//! under `parameters`, `input_schema` or `json_schema`. Everything is folded
//! into the single canonical [`Tool`] shape, with sanitized, deduplicated
//! names. A record that cannot be salvaged is dropped with a warning; it is
//! never a fatal condition for the request.

use crate::types::Tool;
use serde_json::{json, Value};
use tracing::warn;

const MAX_TOOL_NAME_LEN: usize = 64;

fn is_allowed_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Whether `name` already satisfies `^[A-Za-z0-9_-]{1,64}$`.
pub fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_TOOL_NAME_LEN && name.chars().all(is_allowed_name_char)
}

/// Sanitize a candidate tool name.
///
/// Valid names pass through untouched. Otherwise every run of disallowed
/// characters collapses to a single `_`, leading/trailing `_` are stripped and
/// the result is truncated to 64 characters. Returns `None` when nothing
/// valid remains.
pub fn sanitize_tool_name(raw: &str) -> Option<String> {
    if is_valid_tool_name(raw) {
        return Some(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut in_bad_run = false;
    for c in raw.chars() {
        if is_allowed_name_char(c) {
            out.push(c);
            in_bad_run = false;
        } else if !in_bad_run {
            out.push('_');
            in_bad_run = true;
        }
    }

    let trimmed = out.trim_matches('_');
    let truncated: String = trimmed.chars().take(MAX_TOOL_NAME_LEN).collect();

    if is_valid_tool_name(&truncated) {
        Some(truncated)
    } else {
        None
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Name resolution: `record.name`, then `record.function.name`.
fn resolve_name(record: &Value) -> Option<&str> {
    non_empty_str(record.get("name"))
        .or_else(|| non_empty_str(record.get("function").and_then(|f| f.get("name"))))
}

/// Description resolution: `record.description`, then `record.function.description`.
fn resolve_description(record: &Value) -> Option<String> {
    non_empty_str(record.get("description"))
        .or_else(|| non_empty_str(record.get("function").and_then(|f| f.get("description"))))
        .map(str::to_string)
}

/// Ordered schema locations tried by [`resolve_parameters`].
const SCHEMA_LOCATIONS: [&[&str]; 4] = [
    &["function", "parameters"],
    &["parameters"],
    &["input_schema"],
    &["json_schema"],
];

fn lookup_path<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(record, |v, key| v.get(*key))
}

/// Schema resolution: first location holding a plain object wins; the default
/// empty object schema otherwise.
fn resolve_parameters(record: &Value) -> Value {
    for path in SCHEMA_LOCATIONS {
        if let Some(candidate) = lookup_path(record, path) {
            if candidate.is_object() {
                return candidate.clone();
            }
        }
    }
    json!({"type": "object", "properties": {}})
}

/// Normalize a heterogeneous tool list into the canonical form.
///
/// Returns `None` when no record survives, so downstream request building can
/// omit tool-calling entirely. First occurrence wins on name collision.
pub fn normalize_tools(records: &[Value]) -> Option<Vec<Tool>> {
    let mut tools: Vec<Tool> = Vec::with_capacity(records.len());

    for record in records {
        let Some(raw_name) = resolve_name(record) else {
            warn!("dropping tool record without a resolvable name");
            continue;
        };

        let Some(name) = sanitize_tool_name(raw_name) else {
            warn!(raw_name, "dropping tool with unsanitizable name");
            continue;
        };

        if name != raw_name {
            warn!(raw_name, sanitized = %name, "tool name changed by sanitization");
        }

        if tools.iter().any(|t| t.function.name == name) {
            warn!(name = %name, "dropping duplicate tool definition");
            continue;
        }

        tools.push(Tool::function(
            name,
            resolve_description(record),
            resolve_parameters(record),
        ));
    }

    if tools.is_empty() {
        None
    } else {
        Some(tools)
    }
}

pub mod csv_out;
pub mod export;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Result fields that hold row tables, in the order they are preferred when
/// only one table can be shown.
const TABLE_KEYS: [&str; 4] = ["rows", "summary", "rejected", "analyses"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of an envelope, or the value itself.
fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// First non-empty array-of-objects field in `TABLE_KEYS` order.
fn primary_table(result: &Value) -> Option<(&'static str, &Vec<Value>)> {
    let map = result.as_object()?;
    TABLE_KEYS.iter().find_map(|key| match map.get(*key) {
        Some(Value::Array(arr)) if arr.first().is_some_and(Value::is_object) => Some((*key, arr)),
        _ => None,
    })
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

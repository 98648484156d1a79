pub mod csv_out;
pub mod minimal;
pub mod serialized;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => serialized::print_json(value),
        OutputFormat::Yaml => serialized::print_yaml(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The record list a tabular format should print for `result`: the digit
/// test rows, else the first array of objects found.
pub fn primary_rows(result: &Value) -> Option<&Vec<Value>> {
    if let Some(Value::Array(rows)) = result.get("table").and_then(|t| t.get("rows")) {
        return Some(rows);
    }
    if let Some(Value::Array(rows)) = result.get("rows") {
        return Some(rows);
    }
    result
        .as_object()?
        .values()
        .find_map(|v| match v {
            Value::Array(items) if matches!(items.first(), Some(Value::Object(_))) => Some(items),
            _ => None,
        })
}

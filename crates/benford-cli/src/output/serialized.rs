//! Whole-document formats: the result is printed as one JSON or YAML value.

use serde_json::Value;

pub fn print_json(value: &Value) {
    emit("JSON", serde_json::to_string_pretty(value).map(|s| s + "\n").map_err(|e| e.to_string()));
}

pub fn print_yaml(value: &Value) {
    emit("YAML", serde_yaml::to_string(value).map_err(|e| e.to_string()));
}

fn emit(format: &str, rendered: Result<String, String>) {
    match rendered {
        Ok(s) => print!("{}", s),
        Err(e) => eprintln!("{} serialization error: {}", format, e),
    }
}

//! Reading the JSON request: from the file named by `--input`, or piped on stdin.

use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Read the request from `path`, or from stdin when no path is given.
///
/// Returns `None` when there is no path and stdin is a terminal or empty,
/// leaving the caller to fall back to `--values`.
pub fn read_request(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => read_request_file(path).map(Some),
        None => read_piped_request(),
    }
}

fn read_request_file(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let full = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    let meta = fs::metadata(&full)
        .map_err(|e| format!("Cannot open request file '{}': {}", full.display(), e))?;
    if !meta.is_file() {
        return Err(format!("Request path '{}' is not a file", full.display()).into());
    }
    let text = fs::read_to_string(&full)
        .map_err(|e| format!("Cannot read request file '{}': {}", full.display(), e))?;
    let origin = format!("request file '{}'", full.display());
    parse_request(&text, &origin)?.ok_or_else(|| format!("The {} is empty", origin).into())
}

fn read_piped_request() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok(parse_request(&text, "request piped on stdin")?)
}

/// Parse request text; blank text is no request at all.
fn parse_request(text: &str, origin: &str) -> Result<Option<Value>, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("The {} is not valid JSON: {}", origin, e))
}

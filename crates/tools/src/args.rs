//! Argument extraction and output helpers shared by the built-in tools.

use std::path::PathBuf;

use termpilot_core::error::ToolError;
use termpilot_core::tool::ToolArguments;

pub(crate) fn required_str<'a>(args: &'a ToolArguments, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

pub(crate) fn optional_str<'a>(args: &'a ToolArguments, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

/// Integers may arrive as JSON numbers or as numeric strings.
pub(crate) fn optional_u64(args: &ToolArguments, key: &str) -> Option<u64> {
    match args.get(key)? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn optional_bool(args: &ToolArguments, key: &str) -> bool {
    match args.get(key) {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Expand a leading `~` and make the path absolute against the working directory.
pub(crate) fn resolve_path(path: &str) -> PathBuf {
    let expanded = match path.strip_prefix("~/") {
        Some(rest) => std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    };
    std::path::absolute(&expanded).unwrap_or(expanded)
}

/// Cut `output` to at most `max_chars` characters, marking the cut.
pub(crate) fn truncate_output(output: String, max_chars: usize) -> String {
    match output.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}\n... (output truncated)", &output[..byte_index]),
        None => output,
    }
}

#[cfg(test)]
pub(crate) fn test_args(value: serde_json::Value) -> ToolArguments {
    value.as_object().cloned().unwrap_or_default()
}

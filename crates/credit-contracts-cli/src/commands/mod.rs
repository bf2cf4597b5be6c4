pub mod lifecycle;
pub mod schedule;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse a snake_case enum flag (e.g. "quarterly") through its serde names.
pub fn parse_flag<T: DeserializeOwned>(flag: &str, value: &str) -> Result<T, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(value.trim().to_lowercase()))
        .map_err(|_| format!("invalid --{flag} value '{value}'").into())
}

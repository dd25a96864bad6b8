//! Request body helpers.
//!
//! Browser clients post JSON without a content type, so bodies are taken as
//! raw bytes and parsed here instead of through the `Json` extractor.

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;

pub fn parse_json(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::InvalidInput("Request body is empty".into()));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidInput(format!("Malformed JSON: {e}")))?;
    if !value.is_object() {
        return Err(ApiError::InvalidInput("Request body must be a JSON object".into()));
    }
    Ok(value)
}

/// The `action` discriminator of a POST body, if any.
pub fn action_of(value: &Value) -> Option<&str> {
    value
        .get("action")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
}

pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::InvalidInput(format!("Invalid body: {e}")))
}

pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    from_value(parse_json(body)?)
}

/// A trimmed, non-empty parameter or a 400.
pub fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidInput(format!("{name} is required")))
}

pub fn unknown_action(action: Option<&str>) -> ApiError {
    ApiError::InvalidInput(format!("Unknown action: {}", action.unwrap_or("<none>")))
}

pub fn message(text: &str) -> axum::Json<Value> {
    axum::Json(serde_json::json!({ "message": text }))
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

use crate::error::ExtractError;
use serde::de::DeserializeOwned;

/// Pull the JSON body out of a raw model response.
///
/// Fallback chain: a ```` ```json ```` fenced block, then any plain fenced
/// block, then the whole response treated as raw JSON.
#[must_use]
pub fn extract_json(raw: &str) -> &str {
    if let Some(start) = raw.find("```json") {
        let body = &raw[start + "```json".len()..];
        let end = body.find("```").unwrap_or(body.len());
        return body[..end].trim();
    }
    if let Some(start) = raw.find("```") {
        let body = &raw[start + "```".len()..];
        let end = body.find("```").unwrap_or(body.len());
        return body[..end].trim();
    }
    raw.trim()
}

/// Parse a model response into `T`.
///
/// A structured `{error: ...}` payload is the model's "nothing found" answer
/// and maps to `Ok(None)`; anything that fails to parse is a real
/// [`ExtractError::Parse`].
pub fn parse_response<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, ExtractError> {
    let body = extract_json(raw);
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|err| ExtractError::Parse(err.to_string()))?;

    if value.get("error").is_some() {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|err| ExtractError::Parse(err.to_string()))
}

//! Pulling JSON out of model replies.
//!
//! Models often wrap JSON in markdown fences or add a sentence before or
//! after it. These helpers recover the object without being clever about it.

use serde::de::DeserializeOwned;
use vidcycle_core::{Error, Result};

/// Remove a surrounding markdown code fence (```` ```json ```` or bare ```` ``` ````).
pub fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// The outermost `{ ... }` span of a reply, fences removed.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let cleaned = strip_code_fences(raw);
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    (end > start).then(|| &cleaned[start..=end])
}

/// Deserialize the JSON object embedded in a reply.
///
/// Fails with `Parse` when no object is present or it does not match `T`.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let json = extract_json_object(raw)
        .ok_or_else(|| Error::Parse("Reply contained no JSON object".to_string()))?;
    serde_json::from_str(json).map_err(|e| Error::Parse(format!("Malformed reply JSON: {}", e)))
}

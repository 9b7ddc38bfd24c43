//! Strict structured-output parsing for model responses.
//!
//! Models return free-form text around a JSON object. We locate the first
//! balanced object candidate, then deserialize it strictly into the typed
//! schema. Any failure is classified as [`LlmError::Parse`] so call sites
//! can route it through their fallback path explicitly.

use serde::de::DeserializeOwned;

use crate::error::LlmError;

/// Extract the first balanced `{...}` substring and parse it into `T`.
pub fn extract_json<T: DeserializeOwned>(response: &str) -> Result<T, LlmError> {
    let candidate = first_balanced_object(response)
        .ok_or_else(|| LlmError::Parse("no JSON object found in response".to_string()))?;
    serde_json::from_str(candidate).map_err(|e| LlmError::Parse(e.to_string()))
}

/// Find the first balanced top-level JSON object in free-form text.
/// Brace counting is string-aware so braces inside string values do not
/// unbalance the scan.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

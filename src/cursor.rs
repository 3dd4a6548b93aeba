//! Opaque cursor encoding for cursor-based pagination.
//!
//! A cursor encodes the ordering-key values of the row it points to (with the
//! tie-break key last), never a raw offset, so pagination resumes
//! deterministically even when the underlying set mutates between requests.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde_json::Value;

use crate::error::{RelayError, RelayResult};

/// Encode an ordering-key tuple as an opaque cursor string.
pub fn encode_cursor(keys: &[Value]) -> String {
    let payload = Value::Array(keys.to_vec()).to_string();
    BASE64.encode(format!("cursor:{payload}"))
}

/// Decode a cursor back into its ordering-key tuple.
///
/// `expected_keys` is the arity of the field's current ordering; a cursor
/// carrying a different number of keys is stale and rejected.
pub fn decode_cursor(cursor: &str, expected_keys: usize) -> RelayResult<Vec<Value>> {
    let decoded = BASE64
        .decode(cursor)
        .map_err(|_| RelayError::InvalidCursor("invalid cursor format".to_string()))?;

    let text = String::from_utf8(decoded)
        .map_err(|_| RelayError::InvalidCursor("invalid cursor encoding".to_string()))?;

    let payload = text
        .strip_prefix("cursor:")
        .ok_or_else(|| RelayError::InvalidCursor("invalid cursor prefix".to_string()))?;

    let keys: Vec<Value> = serde_json::from_str(payload)
        .map_err(|_| RelayError::InvalidCursor("invalid cursor payload".to_string()))?;

    if keys.len() != expected_keys {
        return Err(RelayError::InvalidCursor(format!(
            "cursor carries {} ordering keys, current ordering has {}",
            keys.len(),
            expected_keys
        )));
    }

    Ok(keys)
}

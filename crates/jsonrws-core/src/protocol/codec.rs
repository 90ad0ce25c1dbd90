//! Wire codec: delimiter framing and field-set validation.
//!
//! The wire form is a UTF-8 string holding one JSON object, followed by a
//! single U+0003 terminator. The terminator is the sole framing signal
//! above the transport; it is stripped before parsing and appended after
//! serializing. Both directions enforce the same property-set invariant:
//! the keys present must be a subset of `{id, from, to, cmd, payload}` and
//! a superset of `{id, from, to, cmd}`.

use serde_json::{Map, Value};

use super::envelope::Envelope;
use crate::error::{JsonRwsError, Result};

/// Message terminator (U+0003, end-of-text). Marks message boundaries for
/// transports that deliver a continuous byte stream; not part of the JSON.
pub const DELIMITER: char = '\u{0003}';

const ALLOWED: [&str; 5] = ["id", "from", "to", "cmd", "payload"];
const REQUIRED: [&str; 4] = ["id", "from", "to", "cmd"];

fn violation(reason: impl Into<String>, raw: &str) -> JsonRwsError {
    JsonRwsError::ProtocolViolation {
        reason: reason.into(),
        raw: raw.to_string(),
    }
}

/// Property-set check shared by decode and encode.
fn check_fields(obj: &Map<String, Value>, raw: &str) -> Result<()> {
    for key in obj.keys() {
        if !ALLOWED.contains(&key.as_str()) {
            return Err(violation(format!("field {key:?} is not allowed"), raw));
        }
    }
    for key in REQUIRED {
        if !obj.contains_key(key) {
            return Err(violation(format!("required field {key:?} is missing"), raw));
        }
    }
    Ok(())
}

/// Parse one wire string into an envelope.
///
/// Strips at most one trailing [`DELIMITER`], parses the remainder as
/// JSON, and validates the property set before typing the value. Every
/// failure is a [`JsonRwsError::ProtocolViolation`] carrying the original
/// raw text.
pub fn decode(raw: &str) -> Result<Envelope> {
    let text = raw.strip_suffix(DELIMITER).unwrap_or(raw);
    let value: Value =
        serde_json::from_str(text).map_err(|e| violation(format!("invalid json: {e}"), raw))?;
    let obj = value
        .as_object()
        .ok_or_else(|| violation("not a json object", raw))?;
    check_fields(obj, raw)?;
    serde_json::from_value(value).map_err(|e| violation(format!("invalid envelope: {e}"), raw))
}

/// Serialize an envelope to its wire form.
///
/// Runs the same property-set check on the serialized object (the error
/// carries the serialized form), then appends the [`DELIMITER`].
pub fn encode(msg: &Envelope) -> Result<String> {
    let value = serde_json::to_value(msg)
        .map_err(|e| JsonRwsError::Internal(format!("envelope serialize failed: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| JsonRwsError::Internal("envelope did not serialize to an object".into()))?;
    let serialized = value.to_string();
    check_fields(obj, &serialized)?;
    let mut out = serialized;
    out.push(DELIMITER);
    Ok(out)
}

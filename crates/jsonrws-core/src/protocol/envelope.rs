//! jsonRWS envelope (JSON).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Addressing target of an envelope: a single socket id, a list of socket
/// ids, a room name, or the sentinel `"0"` (no specific target, used with
/// broadcast and server-only commands).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum To {
    One(String),
    Many(Vec<String>),
}

impl To {
    /// Sentinel meaning "no specific target".
    pub const NONE: &'static str = "0";

    /// The single target, when `to` came as a plain string.
    pub fn as_one(&self) -> Option<&str> {
        match self {
            To::One(s) => Some(s.as_str()),
            To::Many(_) => None,
        }
    }

    /// Target ids regardless of wire shape.
    pub fn ids(&self) -> &[String] {
        match self {
            To::One(s) => std::slice::from_ref(s),
            To::Many(v) => v.as_slice(),
        }
    }

    /// The sentinel target.
    pub fn none() -> Self {
        To::One(Self::NONE.to_string())
    }
}

impl From<&str> for To {
    fn from(s: &str) -> Self {
        To::One(s.to_string())
    }
}

/// The unit of exchange under the subprotocol.
///
/// The wire form carries exactly the fields below and no others; `id`,
/// `from`, `to`, and `cmd` are required, `payload` is optional. The codec
/// enforces that invariant in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Caller-assigned correlation id (e.g. timestamp-derived). Uniqueness
    /// is the caller's concern, not validated here.
    pub id: String,
    /// Identifier of the originating socket.
    pub from: String,
    /// Addressing target; interpretation depends on `cmd`.
    pub to: To,
    /// Command name; selects dispatcher behavior.
    pub cmd: String,
    /// Optional command-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

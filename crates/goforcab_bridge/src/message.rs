// --- File: crates/goforcab_bridge/src/message.rs ---

// Messages posted from the page to the native host: `{"type": ..., "data": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BridgeMessage {
    /// The identity currently shown by the page (`"guest"` when nobody is signed in)
    #[serde(rename = "userId")]
    UserId(String),
    /// Free-form diagnostics; the host only logs these
    #[serde(rename = "debug")]
    Debug(Value),
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Malformed bridge message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode one message as posted by the page.
///
/// Unknown `type` values and bad payloads are errors; the host drops them.
pub fn parse_message(raw: &str) -> Result<BridgeMessage, MessageError> {
    Ok(serde_json::from_str(raw)?)
}

impl BridgeMessage {
    pub fn to_json(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_user_id() {
        let message = parse_message(r#"{"type":"userId","data":"u555"}"#).unwrap();
        assert_eq!(message, BridgeMessage::UserId("u555".to_string()));
    }

    #[test]
    fn test_parse_debug() {
        let message =
            parse_message(r#"{"type":"debug","data":{"storageKeys":["a"],"errors":[]}}"#).unwrap();
        assert_eq!(
            message,
            BridgeMessage::Debug(json!({"storageKeys": ["a"], "errors": []}))
        );
    }

    #[test]
    fn test_rejects_unknown_type_and_bad_payload() {
        assert!(parse_message(r#"{"type":"navigate","data":"x"}"#).is_err());
        assert!(parse_message(r#"{"type":"userId","data":42}"#).is_err());
        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn test_wire_shape() {
        let raw = BridgeMessage::UserId("guest".to_string()).to_json().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, json!({"type": "userId", "data": "guest"}));
    }
}

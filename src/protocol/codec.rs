//! Frame encoding and tolerant decoding.
//!
//! Decoding distinguishes three outcomes:
//!
//! | Input | Result |
//! |-------|--------|
//! | Known tag, valid payload | `Ok(Decoded::Message(_))` |
//! | Unknown tag | `Ok(Decoded::Unknown(tag))`, ignored by receivers |
//! | Known tag with bad payload, no tag, not JSON | `Err(Error::MalformedMessage)` |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// WireMessage
// ============================================================================

/// A closed set of tagged messages for one direction.
pub trait WireMessage: Serialize + DeserializeOwned + Send + 'static {
    /// Every tag this direction understands.
    const TAGS: &'static [&'static str];

    /// Returns this message's tag.
    fn tag(&self) -> &'static str;
}

// ============================================================================
// Decoded
// ============================================================================

/// Result of decoding one text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<M> {
    /// A recognized message.
    Message(M),
    /// A message with a tag this side does not know.
    Unknown(String),
}

// ============================================================================
// Functions
// ============================================================================

/// Serializes a message to a JSON text frame.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn encode<M: WireMessage>(message: &M) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decodes a JSON text frame.
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`] when the frame is not a JSON object
/// with a string `type`, or when a known tag carries an invalid payload.
pub fn decode<M: WireMessage>(text: &str) -> Result<Decoded<M>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::malformed("<none>", e.to_string()))?;

    let Some(tag) = value.get("type").and_then(Value::as_str) else {
        return Err(Error::malformed("<none>", "missing string field `type`"));
    };

    if !M::TAGS.contains(&tag) {
        return Ok(Decoded::Unknown(tag.to_string()));
    }

    let tag = tag.to_string();
    serde_json::from_value(value)
        .map(Decoded::Message)
        .map_err(|e| Error::malformed(tag, e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ClientMessage, HostMessage};

    #[test]
    fn test_decode_known() {
        let decoded = decode::<HostMessage>(r#"{"type":"set-multi-select","enabled":true}"#)
            .expect("decode");
        assert_eq!(
            decoded,
            Decoded::Message(HostMessage::SetMultiSelect { enabled: true })
        );
    }

    #[test]
    fn test_decode_unknown_tag_is_ignored() {
        let decoded =
            decode::<HostMessage>(r#"{"type":"set-theme","dark":true}"#).expect("decode");
        assert_eq!(decoded, Decoded::Unknown("set-theme".into()));
    }

    #[test]
    fn test_decode_extra_fields_tolerated() {
        let decoded =
            decode::<HostMessage>(r#"{"type":"heartbeat","sentAt":12}"#).expect("decode");
        assert_eq!(decoded, Decoded::Message(HostMessage::Heartbeat));
    }

    #[test]
    fn test_decode_bad_payload() {
        let err = decode::<HostMessage>(r#"{"type":"set-inspect-mode","enabled":"yes"}"#)
            .expect_err("should fail");
        match err {
            Error::MalformedMessage { tag, .. } => assert_eq!(tag, "set-inspect-mode"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_missing_type() {
        let err = decode::<ClientMessage>(r#"{"payload":{}}"#).expect_err("should fail");
        assert!(err.is_frame_error());
    }

    #[test]
    fn test_decode_not_json() {
        let err = decode::<ClientMessage>("ready").expect_err("should fail");
        assert!(matches!(err, Error::MalformedMessage { .. }));
    }

    #[test]
    fn test_encode_then_decode_client() {
        let text = encode(&ClientMessage::SelectionsCleared).expect("encode");
        let decoded = decode::<ClientMessage>(&text).expect("decode");
        assert_eq!(decoded, Decoded::Message(ClientMessage::SelectionsCleared));
    }
}

//! Envelope codec.
//!
//! Every frame on the wire is a JSON text frame carrying an envelope.
//!
//! # Format
//!
//! Outbound (client → server):
//! ```json
//! { "operation": "chat.send", "data": { ... } }
//! ```
//!
//! Inbound (server → client):
//! ```json
//! { "operation": "chat.message", "data": { ... }, "error": "reason" }
//! ```
//!
//! `data` and `error` are independent: an inbound envelope may carry both,
//! either, or neither.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value, from_str, to_string};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Envelope key naming the operation.
pub const OPERATION_KEY: &str = "operation";

/// Envelope key carrying the payload.
pub const DATA_KEY: &str = "data";

/// Envelope key carrying a server-signaled error.
pub const ERROR_KEY: &str = "error";

// ============================================================================
// OutboundEnvelope
// ============================================================================

/// An envelope from the client to the server.
///
/// Borrows both fields so encoding never clones the payload.
#[derive(Debug, Serialize)]
pub struct OutboundEnvelope<'a, T: ?Sized> {
    /// Operation name.
    pub operation: &'a str,

    /// Operation payload.
    pub data: &'a T,
}

impl<'a, T: Serialize + ?Sized> OutboundEnvelope<'a, T> {
    /// Creates an outbound envelope.
    #[inline]
    #[must_use]
    pub const fn new(operation: &'a str, data: &'a T) -> Self {
        Self { operation, data }
    }

    /// Serializes the envelope into the text of one frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if `data` cannot be
    /// represented as JSON.
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(self)?)
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A decoded inbound envelope.
///
/// Decoding is lenient about shape: anything that parses as JSON yields an
/// envelope. A frame whose `operation` is missing or not a string has
/// `operation == None` and matches no listener.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Operation name, if present and a string.
    pub operation: Option<String>,

    /// Payload. An explicit `null` is kept as `Some(Value::Null)`.
    pub data: Option<Value>,

    /// Server-signaled error.
    ///
    /// Strings are kept verbatim. `null`, `false` and `0` are absent.
    /// Any other JSON value is carried as its JSON text.
    pub error: Option<String>,
}

impl Envelope {
    /// Decodes the text of one inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not valid
    /// JSON. This is the only failure: the frame is then malformed.
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value = from_str(text)?;
        Ok(Self::from_value(value))
    }

    /// Builds an envelope from an already-parsed JSON value.
    ///
    /// Non-object values produce an empty envelope.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    fn from_map(mut map: Map<String, Value>) -> Self {
        let operation = match map.remove(OPERATION_KEY) {
            Some(Value::String(operation)) => Some(operation),
            _ => None,
        };

        Self {
            operation,
            data: map.remove(DATA_KEY),
            error: map.remove(ERROR_KEY).and_then(normalize_error),
        }
    }

    /// Returns `true` if the envelope carries a non-empty error.
    ///
    /// Only such envelopes reach the error hook.
    #[inline]
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|error| !error.is_empty())
    }

    /// Returns the operation name, or an empty string if absent.
    #[inline]
    #[must_use]
    pub fn operation_or_default(&self) -> &str {
        self.operation.as_deref().unwrap_or_default()
    }
}

/// Maps a raw `error` value onto its string form.
fn normalize_error(value: Value) -> Option<String> {
    match value {
        Value::String(error) => Some(error),
        Value::Null | Value::Bool(false) => None,
        Value::Number(ref number) if number.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_outbound_shape() -> anyhow::Result<()> {
        let data = json!({"a": 1});
        let text = OutboundEnvelope::new("X", &data).encode()?;

        let value: Value = serde_json::from_str(&text)?;
        assert_eq!(value, json!({"operation": "X", "data": {"a": 1}}));
        Ok(())
    }

    #[test]
    fn test_outbound_then_decode_keeps_operation_and_data() {
        let text = OutboundEnvelope::new("X", &json!({"a": 1}))
            .encode()
            .expect("encode");

        let envelope = Envelope::decode(&text).expect("decode");
        assert_eq!(envelope.operation.as_deref(), Some("X"));
        assert_eq!(envelope.data, Some(json!({"a": 1})));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn test_outbound_with_struct_payload() {
        #[derive(Serialize)]
        struct Join {
            room: &'static str,
        }

        let text = OutboundEnvelope::new("room.join", &Join { room: "lobby" })
            .encode()
            .expect("encode");
        assert_eq!(text, r#"{"operation":"room.join","data":{"room":"lobby"}}"#);
    }

    #[test]
    fn test_outbound_rejects_non_string_map_keys() {
        let mut data = std::collections::HashMap::new();
        data.insert((1, 2), "x");

        let result = OutboundEnvelope::new("bad", &data).encode();
        assert!(matches!(result, Err(crate::Error::Json(_))));
    }

    #[test]
    fn test_decode_data_without_error() {
        let envelope = Envelope::decode(r#"{"operation":"ping","data":{"x":1}}"#).expect("decode");

        assert_eq!(envelope.operation.as_deref(), Some("ping"));
        assert_eq!(envelope.data, Some(json!({"x": 1})));
        assert!(!envelope.has_error());
    }

    #[test]
    fn test_decode_error_without_data() {
        let envelope = Envelope::decode(r#"{"operation":"ping","error":"boom"}"#).expect("decode");

        assert_eq!(envelope.error.as_deref(), Some("boom"));
        assert!(envelope.data.is_none());
        assert!(envelope.has_error());
    }

    #[test]
    fn test_decode_both_data_and_error() {
        let envelope =
            Envelope::decode(r#"{"operation":"save","data":[1,2],"error":"partial"}"#).expect("decode");

        assert_eq!(envelope.data, Some(json!([1, 2])));
        assert_eq!(envelope.error.as_deref(), Some("partial"));
    }

    #[test]
    fn test_decode_missing_operation() {
        let envelope = Envelope::decode(r#"{"data":1}"#).expect("decode");
        assert!(envelope.operation.is_none());
        assert_eq!(envelope.operation_or_default(), "");
    }

    #[test]
    fn test_decode_non_string_operation_is_unmatched() {
        let envelope = Envelope::decode(r#"{"operation":5}"#).expect("decode");
        assert!(envelope.operation.is_none());
    }

    #[test]
    fn test_decode_non_object_is_empty() {
        assert_eq!(Envelope::decode("42").expect("decode"), Envelope::default());
        assert_eq!(Envelope::decode("[]").expect("decode"), Envelope::default());
        assert_eq!(Envelope::decode("null").expect("decode"), Envelope::default());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(Envelope::decode("not json").is_err());
        assert!(Envelope::decode(r#"{"operation":"#).is_err());
        assert!(Envelope::decode("").is_err());
    }

    #[test]
    fn test_explicit_null_data_is_kept() {
        let envelope = Envelope::decode(r#"{"operation":"a","data":null}"#).expect("decode");
        assert_eq!(envelope.data, Some(Value::Null));
    }

    #[test]
    fn test_error_normalization() {
        let decode = |text: &str| Envelope::decode(text).expect("decode").error;

        assert_eq!(decode(r#"{"error":null}"#), None);
        assert_eq!(decode(r#"{"error":false}"#), None);
        assert_eq!(decode(r#"{"error":0}"#), None);
        assert_eq!(decode(r#"{"error":""}"#), Some(String::new()));
        assert_eq!(decode(r#"{"error":404}"#), Some("404".to_string()));
        assert_eq!(
            decode(r#"{"error":{"code":1}}"#),
            Some(r#"{"code":1}"#.to_string())
        );
    }

    #[test]
    fn test_empty_error_is_not_an_error() {
        let envelope = Envelope::decode(r#"{"operation":"a","error":""}"#).expect("decode");
        assert!(envelope.error.is_some());
        assert!(!envelope.has_error());
    }

    proptest! {
        #[test]
        fn prop_decode_arbitrary_text_never_panics(text in ".*") {
            let _ = Envelope::decode(&text);
        }

        #[test]
        fn prop_truncated_frames_are_rejected(operation in "[a-z.]{1,16}", cut in 1usize..20) {
            let frame = json!({"operation": operation, "data": {"n": 1}}).to_string();
            let end = frame.len().saturating_sub(cut).max(1);
            prop_assert!(Envelope::decode(&frame[..end]).is_err());
        }

        #[test]
        fn prop_string_fields_survive_decode(operation in ".*", error in ".+") {
            let frame = json!({"operation": operation, "error": error}).to_string();
            let envelope = Envelope::decode(&frame).expect("decode");
            prop_assert_eq!(envelope.operation.as_deref(), Some(operation.as_str()));
            prop_assert_eq!(envelope.error.as_deref(), Some(error.as_str()));
            prop_assert!(envelope.has_error());
        }
    }
}

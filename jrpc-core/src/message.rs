//! Message classification
//!
//! A peer may send any of four document shapes: a single request, a batch of
//! requests, a single response or a batch of responses. [`detect_kind`]
//! decides which one a parsed document is, by shape alone:
//!
//! 1. An array is a batch, classified by its first element. An empty array
//!    has no kind.
//! 2. An object with `method` is a request; an object with `result` or
//!    `error` is a response. Having both, or neither, is invalid.
//! 3. Anything else is invalid.
//!
//! [`Message`] is the closed sum over the four shapes. Parsing a message
//! classifies the tree once and hands the same tree to the matching
//! extractor.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Message, MessageKind};
//!
//! let message = Message::parse(r#"{"jsonrpc":"2.0","id":1,"result":true}"#).unwrap();
//! assert_eq!(message.kind(), MessageKind::ResponseSingle);
//!
//! assert!(Message::parse("[]").is_err());
//! ```

use crate::batch::{RequestBatch, ResponseBatch};
use crate::codec::{self, Codec, Envelope};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::types::{Request, Response};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Shape of a JSON-RPC document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A single request or notification
    RequestSingle,
    /// An array of requests
    RequestBatch,
    /// A single response
    ResponseSingle,
    /// An array of responses
    ResponseBatch,
}

impl MessageKind {
    /// Label used in logs and metric attributes
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::RequestSingle => "request",
            MessageKind::RequestBatch => "request_batch",
            MessageKind::ResponseSingle => "response",
            MessageKind::ResponseBatch => "response_batch",
        }
    }

    /// True for the array shapes
    pub fn is_batch(self) -> bool {
        matches!(self, MessageKind::RequestBatch | MessageKind::ResponseBatch)
    }

    /// True for the request shapes
    pub fn is_request(self) -> bool {
        matches!(self, MessageKind::RequestSingle | MessageKind::RequestBatch)
    }

    /// The array shape holding items of this kind
    pub fn batch(self) -> Self {
        match self {
            MessageKind::RequestSingle | MessageKind::RequestBatch => MessageKind::RequestBatch,
            MessageKind::ResponseSingle | MessageKind::ResponseBatch => MessageKind::ResponseBatch,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a parsed document
///
/// # Errors
///
/// Returns `Error::Validation` for an empty array, a non-object first
/// element, a document with both `method` and `result`/`error`, a document
/// with neither, or any document that is not an array or object.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{detect_kind, MessageKind};
/// use serde_json::json;
///
/// let kind = detect_kind(&json!([{"jsonrpc": "2.0", "method": "a"}])).unwrap();
/// assert_eq!(kind, MessageKind::RequestBatch);
///
/// assert!(detect_kind(&json!({"method": "a", "result": 1})).is_err());
/// ```
pub fn detect_kind(document: &Value) -> Result<MessageKind> {
    match document {
        Value::Array(elements) => {
            let first = elements
                .first()
                .ok_or_else(|| Error::validation("empty batch has no message kind"))?;
            classify_object(first).map(MessageKind::batch)
        }
        Value::Object(_) => classify_object(document),
        other => Err(Error::validation(format!(
            "cannot classify a JSON {}",
            codec::json_type(other)
        ))),
    }
}

fn classify_object(document: &Value) -> Result<MessageKind> {
    let map = document.as_object().ok_or_else(|| {
        Error::validation(format!(
            "batch element must be a JSON object, got {}",
            codec::json_type(document)
        ))
    })?;

    let has_method = map.contains_key("method");
    let has_outcome = map.contains_key("result") || map.contains_key("error");

    match (has_method, has_outcome) {
        (true, false) => Ok(MessageKind::RequestSingle),
        (false, true) => Ok(MessageKind::ResponseSingle),
        (true, true) => Err(Error::validation(
            "document carries both method and result/error",
        )),
        (false, false) => Err(Error::validation(
            "document carries neither method nor result/error",
        )),
    }
}

/// Any JSON-RPC document
///
/// Serializes as its payload, with no wrapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A single request or notification
    Request(Request),
    /// An array of requests
    RequestBatch(RequestBatch),
    /// A single response
    Response(Response),
    /// An array of responses
    ResponseBatch(ResponseBatch),
}

impl Message {
    /// Shape of the payload
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Request(_) => MessageKind::RequestSingle,
            Message::RequestBatch(_) => MessageKind::RequestBatch,
            Message::Response(_) => MessageKind::ResponseSingle,
            Message::ResponseBatch(_) => MessageKind::ResponseBatch,
        }
    }

    /// Number of envelopes carried, 1 for the single shapes
    pub fn item_count(&self) -> usize {
        match self {
            Message::Request(_) | Message::Response(_) => 1,
            Message::RequestBatch(batch) => batch.len(),
            Message::ResponseBatch(batch) => batch.len(),
        }
    }

    /// Parse and classify JSON text
    pub fn parse(text: &str) -> Result<Self> {
        Codec::default().decode(text)
    }

    /// Classify and extract an already parsed document
    pub fn from_value(value: Value) -> Result<Self> {
        Self::extract(value, &Limits::default())
    }

    /// Validate and serialize to JSON text
    pub fn to_json(&self) -> Result<String> {
        Codec::default().encode(self)
    }

    /// Validate and serialize into `buf`
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<usize> {
        Codec::default().encode_into(self, buf)
    }

    /// The request, if this is a single request
    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Message::Request(request) => Some(request),
            _ => None,
        }
    }

    /// The response, if this is a single response
    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Message::Response(response) => Some(response),
            _ => None,
        }
    }
}

impl Envelope for Message {
    fn kind(&self) -> MessageKind {
        Message::kind(self)
    }

    fn item_count(&self) -> usize {
        Message::item_count(self)
    }

    fn validate_with(&self, limits: &Limits) -> Result<()> {
        match self {
            Message::Request(request) => request.validate_with(limits),
            Message::RequestBatch(batch) => batch.validate_with(limits),
            Message::Response(response) => response.validate_with(limits),
            Message::ResponseBatch(batch) => batch.validate_with(limits),
        }
    }

    fn extract(value: Value, limits: &Limits) -> Result<Self> {
        match detect_kind(&value)? {
            MessageKind::RequestSingle => codec::extract_request(value, limits).map(Message::Request),
            MessageKind::RequestBatch => {
                RequestBatch::extract(value, limits).map(Message::RequestBatch)
            }
            MessageKind::ResponseSingle => {
                codec::extract_response(value, limits).map(Message::Response)
            }
            MessageKind::ResponseBatch => {
                ResponseBatch::extract(value, limits).map(Message::ResponseBatch)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::extract(value, &Limits::default()).map_err(serde::de::Error::custom)
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<RequestBatch> for Message {
    fn from(batch: RequestBatch) -> Self {
        Message::RequestBatch(batch)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

impl From<ResponseBatch> for Message {
    fn from(batch: ResponseBatch) -> Self {
        Message::ResponseBatch(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_single_shapes() {
        assert_eq!(
            detect_kind(&json!({"jsonrpc": "2.0", "method": "x"})).unwrap(),
            MessageKind::RequestSingle
        );
        assert_eq!(
            detect_kind(&json!({"jsonrpc": "2.0", "id": 1, "error": {}})).unwrap(),
            MessageKind::ResponseSingle
        );
    }

    #[test]
    fn test_detect_batch_uses_first_element() {
        let mixed = json!([
            {"jsonrpc": "2.0", "id": 1, "result": 1},
            {"jsonrpc": "2.0", "method": "a"}
        ]);
        assert_eq!(detect_kind(&mixed).unwrap(), MessageKind::ResponseBatch);
    }

    #[test]
    fn test_detect_rejects_ambiguous_and_empty() {
        assert!(matches!(detect_kind(&json!([])), Err(Error::Validation(_))));
        assert!(matches!(
            detect_kind(&json!({"method": "a", "error": {}})),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            detect_kind(&json!({"jsonrpc": "2.0", "id": 1})),
            Err(Error::Validation(_))
        ));
        assert!(matches!(detect_kind(&json!([1, 2])), Err(Error::Validation(_))));
        assert!(matches!(detect_kind(&json!("text")), Err(Error::Validation(_))));
    }

    #[test]
    fn test_kind_helpers() {
        assert_eq!(MessageKind::RequestSingle.batch(), MessageKind::RequestBatch);
        assert_eq!(MessageKind::ResponseBatch.batch(), MessageKind::ResponseBatch);
        assert!(MessageKind::ResponseBatch.is_batch());
        assert!(!MessageKind::ResponseSingle.is_request());
        assert_eq!(MessageKind::RequestBatch.to_string(), "request_batch");
    }

    #[test]
    fn test_message_payload_and_count() {
        let message = Message::parse(
            r#"[{"jsonrpc":"2.0","method":"a","id":1},{"jsonrpc":"2.0","method":"b"}]"#,
        )
        .unwrap();
        assert_eq!(message.kind(), MessageKind::RequestBatch);
        assert_eq!(message.item_count(), 2);
        assert!(message.as_request().is_none());

        match message {
            Message::RequestBatch(batch) => assert!(batch[1].is_notification()),
            other => panic!("Expected request batch, got {:?}", other),
        }
    }

    #[test]
    fn test_message_serializes_unwrapped() {
        let message: Message = Response::success(json!(true), 1).into();
        assert_eq!(message.to_json().unwrap(), r#"{"jsonrpc":"2.0","id":1,"result":true}"#);

        let back: Message = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn test_message_extraction_failure_returns_no_message() {
        let result = Message::parse(r#"{"jsonrpc":"2.0","method":7}"#);
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}

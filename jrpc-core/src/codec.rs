//! Codec for JSON-RPC envelope serialization and parsing
//!
//! This module holds the two pipelines of the crate:
//!
//! - **Build/Serialize**: an envelope is validated, then written as JSON
//!   text. The envelope's sub-documents are borrowed while writing, so the
//!   envelope keeps ownership whether or not serialization succeeds.
//! - **Parse/Extract**: JSON text is parsed into a `serde_json::Value`, then
//!   each member is checked and moved out of the tree into a typed envelope.
//!
//! # Why a Codec Type?
//!
//! serde alone cannot express the protocol rules (mutually exclusive
//! `result`/`error`, id typing, length ceilings). A [`Codec`] binds both
//! pipelines to a set of [`Limits`] and, optionally, to [`CodecMetrics`].
//! The free functions in this module and the inherent `parse`/`to_json`
//! methods on the envelope types use a default codec.
//!
//! # Error Handling
//!
//! - Malformed JSON → `Error::Parse`
//! - Protocol violations → `Error::Validation`
//! - JSON writer failures → `Error::Serialization`
//! - Output buffer too small → `Error::Capacity`
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{codec, Request};
//!
//! let request = Request::with_id("ping", 1).unwrap();
//! let json = codec::encode_request(&request).unwrap();
//!
//! let decoded = codec::decode(&json).unwrap();
//! assert!(decoded.as_request().is_some());
//! ```

use crate::batch::{self, RequestBatch, ResponseBatch};
use crate::error::{Error, ErrorObject, Result};
use crate::limits::{Limits, JSONRPC_VERSION};
use crate::message::{detect_kind, Message, MessageKind};
use crate::metrics::CodecMetrics;
use crate::types::{Id, Request, Response};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::sync::Arc;

/// A document the codec can validate, write and extract
///
/// Implemented by [`Request`], [`Response`], their batches and [`Message`].
pub trait Envelope: Serialize + Sized {
    /// Shape of this envelope
    fn kind(&self) -> MessageKind;

    /// Number of envelopes carried
    fn item_count(&self) -> usize {
        1
    }

    /// Check the protocol rules against `limits`
    fn validate_with(&self, limits: &Limits) -> Result<()>;

    /// Build the envelope from a parsed document, moving sub-documents out
    fn extract(value: Value, limits: &Limits) -> Result<Self>;
}

/// A single envelope that may be carried in a [`Batch`](crate::Batch)
pub trait BatchItem: Envelope {
    /// Shape of a batch of these items
    const BATCH_KIND: MessageKind;
}

impl Envelope for Request {
    fn kind(&self) -> MessageKind {
        MessageKind::RequestSingle
    }

    fn validate_with(&self, limits: &Limits) -> Result<()> {
        Request::validate_with(self, limits)
    }

    fn extract(value: Value, limits: &Limits) -> Result<Self> {
        extract_request(value, limits)
    }
}

impl BatchItem for Request {
    const BATCH_KIND: MessageKind = MessageKind::RequestBatch;
}

impl Envelope for Response {
    fn kind(&self) -> MessageKind {
        MessageKind::ResponseSingle
    }

    fn validate_with(&self, limits: &Limits) -> Result<()> {
        Response::validate_with(self, limits)
    }

    fn extract(value: Value, limits: &Limits) -> Result<Self> {
        extract_response(value, limits)
    }
}

impl BatchItem for Response {
    const BATCH_KIND: MessageKind = MessageKind::ResponseBatch;
}

/// Serialization and parsing bound to a set of [`Limits`]
///
/// Cloning a codec is cheap; clones share the same metrics instruments.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{Codec, Error, Limits};
///
/// let codec = Codec::new(Limits::default().with_max_method_len(8));
/// let result = codec.decode_request(r#"{"jsonrpc":"2.0","method":"much_too_long"}"#);
/// assert!(matches!(result, Err(Error::Validation(_))));
/// ```
#[derive(Clone, Default)]
pub struct Codec {
    limits: Limits,
    metrics: Option<Arc<CodecMetrics>>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("limits", &self.limits)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Codec {
    /// Create a codec enforcing `limits`
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            metrics: None,
        }
    }

    /// Record activity on `metrics`
    pub fn with_metrics(mut self, metrics: CodecMetrics) -> Self {
        self.metrics = Some(Arc::new(metrics));
        self
    }

    /// Record activity on shared `metrics`
    pub fn with_shared_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Limits enforced by this codec
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validate and serialize an envelope to JSON text
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the envelope breaks a protocol rule,
    /// or `Error::Serialization` if the JSON writer fails.
    pub fn encode<T: Envelope>(&self, envelope: &T) -> Result<String> {
        let result = self.render(envelope);
        self.observe_encoded(envelope.kind(), envelope.item_count(), &result);
        result
    }

    /// Validate and serialize an envelope into `buf`
    ///
    /// Returns the number of bytes written. When `buf` is too small the
    /// call fails with `Error::Capacity` and `buf` is left untouched.
    ///
    /// ```rust
    /// use jrpc_core::{Codec, Error, Request};
    ///
    /// let request = Request::new("ping").unwrap();
    /// let mut small = [0u8; 8];
    /// let result = Codec::default().encode_into(&request, &mut small);
    /// assert!(matches!(result, Err(Error::Capacity { required: 33, available: 8 })));
    ///
    /// let mut buf = [0u8; 64];
    /// let written = Codec::default().encode_into(&request, &mut buf).unwrap();
    /// assert_eq!(&buf[..written], br#"{"jsonrpc":"2.0","method":"ping"}"#);
    /// ```
    pub fn encode_into<T: Envelope>(&self, envelope: &T, buf: &mut [u8]) -> Result<usize> {
        let result = self
            .render(envelope)
            .and_then(|text| copy_into(text.as_bytes(), buf));
        self.observe_encoded(envelope.kind(), envelope.item_count(), &result);
        result
    }

    /// Validate and serialize a slice of envelopes as one JSON array
    ///
    /// Every item is validated before any text is produced.
    pub fn encode_batch<T: BatchItem>(&self, items: &[T]) -> Result<String> {
        let result = batch::validate_items(items, &self.limits).and_then(|()| to_text(items));
        self.observe_encoded(T::BATCH_KIND, items.len(), &result);
        result
    }

    /// Parse JSON text as envelope type `T`
    pub fn decode_as<T: Envelope>(&self, text: &str) -> Result<T> {
        let result = parse_document(text).and_then(|value| T::extract(value, &self.limits));
        self.observe_decoded(&result);
        result
    }

    /// Parse a single request
    pub fn decode_request(&self, text: &str) -> Result<Request> {
        self.decode_as(text)
    }

    /// Parse a single response
    pub fn decode_response(&self, text: &str) -> Result<Response> {
        self.decode_as(text)
    }

    /// Parse a batch of requests; `[]` yields an empty batch
    pub fn decode_request_batch(&self, text: &str) -> Result<RequestBatch> {
        self.decode_as(text)
    }

    /// Parse a batch of responses; `[]` yields an empty batch
    pub fn decode_response_batch(&self, text: &str) -> Result<ResponseBatch> {
        self.decode_as(text)
    }

    /// Parse, classify and extract any JSON-RPC document
    ///
    /// The text is parsed once; the classified tree is handed to the
    /// matching extractor.
    #[tracing::instrument(level = "debug", skip_all, fields(len = text.len()))]
    pub fn decode(&self, text: &str) -> Result<Message> {
        self.decode_as(text)
    }

    /// Classify and extract an already parsed document
    pub fn decode_value(&self, value: Value) -> Result<Message> {
        let result = Message::extract(value, &self.limits);
        self.observe_decoded(&result);
        result
    }

    /// Parse a standalone error object
    pub fn decode_error_object(&self, text: &str) -> Result<ErrorObject> {
        let result = parse_document(text).and_then(|value| extract_error_object(value, &self.limits));
        if let Err(err) = &result {
            self.observe_failure("decode", err);
        }
        result
    }

    /// Parse JSON text and report its shape without extracting it
    #[tracing::instrument(level = "debug", skip_all, fields(len = text.len()))]
    pub fn peek_kind(&self, text: &str) -> Result<MessageKind> {
        let result = parse_document(text).and_then(|value| detect_kind(&value));
        match &result {
            Ok(kind) => tracing::debug!(kind = %kind, "classified document"),
            Err(err) => self.observe_failure("classify", err),
        }
        result
    }

    fn render<T: Envelope>(&self, envelope: &T) -> Result<String> {
        envelope.validate_with(&self.limits)?;
        to_text(envelope)
    }

    fn observe_encoded<R>(&self, kind: MessageKind, items: usize, result: &Result<R>) {
        match result {
            Ok(_) => {
                tracing::trace!(kind = %kind, items, "serialized envelope");
                if let Some(metrics) = &self.metrics {
                    metrics.record_serialized(kind, items);
                }
            }
            Err(err) => self.observe_failure("encode", err),
        }
    }

    fn observe_decoded<T: Envelope>(&self, result: &Result<T>) {
        match result {
            Ok(envelope) => {
                let kind = envelope.kind();
                tracing::debug!(kind = %kind, items = envelope.item_count(), "parsed envelope");
                if let Some(metrics) = &self.metrics {
                    metrics.record_parsed(kind, envelope.item_count());
                }
            }
            Err(err) => self.observe_failure("decode", err),
        }
    }

    fn observe_failure(&self, operation: &'static str, err: &Error) {
        tracing::trace!(operation, error_type = err.kind(), error = %err, "rejected document");
        if let Some(metrics) = &self.metrics {
            metrics.record_error(err.kind(), operation);
        }
    }
}

fn to_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Serialization(e.to_string()))
}

fn copy_into(bytes: &[u8], buf: &mut [u8]) -> Result<usize> {
    if bytes.len() > buf.len() {
        return Err(Error::Capacity {
            required: bytes.len(),
            available: buf.len(),
        });
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

fn parse_document(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_object(value: Value, what: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::validation(format!(
            "{} must be a JSON object, got {}",
            what,
            json_type(&other)
        ))),
    }
}

fn take_version(map: &mut Map<String, Value>) -> Result<String> {
    match map.remove("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => Ok(version),
        Some(Value::String(version)) => Err(Error::validation(format!(
            "unsupported jsonrpc version {:?}",
            version
        ))),
        Some(other) => Err(Error::validation(format!(
            "jsonrpc must be a string, got {}",
            json_type(&other)
        ))),
        None => Err(Error::validation("missing jsonrpc member")),
    }
}

/// Move a non-empty string of at most `max` bytes out of `map`
fn take_bounded_string(map: &mut Map<String, Value>, key: &str, max: usize) -> Result<String> {
    match map.remove(key) {
        Some(Value::String(s)) if s.is_empty() => {
            Err(Error::validation(format!("{} must not be empty", key)))
        }
        Some(Value::String(s)) if s.len() > max => Err(Error::validation(format!(
            "{} exceeds {} bytes",
            key, max
        ))),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(Error::validation(format!(
            "{} must be a string, got {}",
            key,
            json_type(&other)
        ))),
        None => Err(Error::validation(format!("missing {} member", key))),
    }
}

pub(crate) fn extract_id(value: Value, limits: &Limits) -> Result<Id> {
    match value {
        Value::Null => Ok(Id::Null),
        Value::String(s) if s.is_empty() => Err(Error::validation("string id must not be empty")),
        Value::String(s) if s.len() > limits.max_id_len => Err(Error::validation(format!(
            "string id exceeds {} bytes",
            limits.max_id_len
        ))),
        Value::String(s) => Ok(Id::String(s)),
        Value::Number(n) => number_to_id(&n, limits.id_tolerance),
        other => Err(Error::validation(format!(
            "id must be a string, number or null, got {}",
            json_type(&other)
        ))),
    }
}

fn number_to_id(n: &Number, tolerance: f64) -> Result<Id> {
    if let Some(i) = n.as_i64() {
        return Ok(Id::Number(i));
    }
    if n.is_u64() {
        return Err(Error::validation(format!(
            "numeric id {} is outside the signed 64-bit range",
            n
        )));
    }
    match n.as_f64() {
        Some(f) => integer_from_double(f, tolerance).map(Id::Number),
        None => Err(Error::validation(format!("numeric id {} is not representable", n))),
    }
}

/// Accept a double that lies within `tolerance` of an i64
///
/// The nearest integer is taken, so `4.99999999999999` reads as 5.
/// `i64::MAX as f64` rounds up to 2^63, which is accepted and saturates to
/// `i64::MAX` so that ids written as doubles read back.
fn integer_from_double(value: f64, tolerance: f64) -> Result<i64> {
    if !value.is_finite() || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(Error::validation(format!(
            "numeric id {} is outside the signed 64-bit range",
            value
        )));
    }
    let rounded = value.round();
    if (value - rounded).abs() > tolerance {
        return Err(Error::validation(format!(
            "numeric id {} is not an integer",
            value
        )));
    }
    Ok(rounded as i64)
}

pub(crate) fn extract_request(value: Value, limits: &Limits) -> Result<Request> {
    let mut map = expect_object(value, "request")?;
    if map.contains_key("result") || map.contains_key("error") {
        return Err(Error::validation("request carries result or error"));
    }
    let jsonrpc = take_version(&mut map)?;
    let method = take_bounded_string(&mut map, "method", limits.max_method_len)?;

    let params = match map.remove("params") {
        None => None,
        Some(params @ (Value::Array(_) | Value::Object(_))) => Some(params),
        Some(other) => {
            return Err(Error::validation(format!(
                "params must be an array or object, got {}",
                json_type(&other)
            )))
        }
    };

    let id = map
        .remove("id")
        .map(|id| extract_id(id, limits))
        .transpose()?;

    Ok(Request {
        jsonrpc,
        id,
        method,
        params,
    })
}

pub(crate) fn extract_response(value: Value, limits: &Limits) -> Result<Response> {
    let mut map = expect_object(value, "response")?;
    if map.contains_key("method") {
        return Err(Error::validation("response carries method"));
    }
    let jsonrpc = take_version(&mut map)?;
    let id = match map.remove("id") {
        Some(id) => extract_id(id, limits)?,
        None => return Err(Error::validation("missing id member")),
    };

    let (result, error) = match (map.remove("result"), map.remove("error")) {
        (Some(result), None) => (Some(result), None),
        (None, Some(error)) => (None, Some(extract_error_object(error, limits)?)),
        (Some(_), Some(_)) => {
            return Err(Error::validation("response carries both result and error"))
        }
        (None, None) => {
            return Err(Error::validation(
                "response carries neither result nor error",
            ))
        }
    };

    Ok(Response {
        jsonrpc,
        id,
        result,
        error,
    })
}

pub(crate) fn extract_error_object(value: Value, limits: &Limits) -> Result<ErrorObject> {
    let mut map = expect_object(value, "error")?;

    let code = match map.remove("code") {
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|code| i32::try_from(code).ok())
            .ok_or_else(|| {
                Error::validation(format!("error code {} is not a 32-bit integer", n))
            })?,
        Some(other) => {
            return Err(Error::validation(format!(
                "error code must be an integer, got {}",
                json_type(&other)
            )))
        }
        None => return Err(Error::validation("missing error code")),
    };

    let message = take_bounded_string(&mut map, "message", limits.max_error_message_len)?;

    Ok(ErrorObject {
        code,
        message,
        data: map.remove("data"),
    })
}

/// Validate and serialize a request with the default codec
pub fn encode_request(request: &Request) -> Result<String> {
    Codec::default().encode(request)
}

/// Parse a request with the default codec
pub fn decode_request(text: &str) -> Result<Request> {
    Codec::default().decode_request(text)
}

/// Validate and serialize a response with the default codec
pub fn encode_response(response: &Response) -> Result<String> {
    Codec::default().encode(response)
}

/// Parse a response with the default codec
pub fn decode_response(text: &str) -> Result<Response> {
    Codec::default().decode_response(text)
}

/// Validate and serialize requests as one JSON array
///
/// ```rust
/// use jrpc_core::{codec, Request};
///
/// let requests = vec![Request::with_id("a", 1).unwrap(), Request::new("b").unwrap()];
/// let json = codec::encode_request_batch(&requests).unwrap();
/// assert!(json.starts_with('['));
/// ```
pub fn encode_request_batch(requests: &[Request]) -> Result<String> {
    Codec::default().encode_batch(requests)
}

/// Validate and serialize responses as one JSON array
pub fn encode_response_batch(responses: &[Response]) -> Result<String> {
    Codec::default().encode_batch(responses)
}

/// Parse a request batch with the default codec
pub fn decode_request_batch(text: &str) -> Result<RequestBatch> {
    Codec::default().decode_request_batch(text)
}

/// Parse a response batch with the default codec
pub fn decode_response_batch(text: &str) -> Result<ResponseBatch> {
    Codec::default().decode_response_batch(text)
}

/// Parse, classify and extract any document with the default codec
pub fn decode(text: &str) -> Result<Message> {
    Codec::default().decode(text)
}

/// Report the shape of a document with the default codec
///
/// ```rust
/// use jrpc_core::{codec, MessageKind};
///
/// let kind = codec::peek_kind(r#"[{"jsonrpc":"2.0","method":"a"}]"#).unwrap();
/// assert_eq!(kind, MessageKind::RequestBatch);
/// ```
pub fn peek_kind(text: &str) -> Result<MessageKind> {
    Codec::default().peek_kind(text)
}

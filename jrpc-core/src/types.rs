//! JSON-RPC 2.0 envelope types
//!
//! This module holds the single-message envelopes of the protocol
//! (https://www.jsonrpc.org/specification):
//!
//! 1. **Request**: a call to a remote method. A request without an `id` is a
//!    *notification* and expects no response.
//! 2. **Response**: the outcome of a request, carrying exactly one of a
//!    `result` document or an [`ErrorObject`].
//!
//! Both envelopes own their sub-documents (`params`, `result`, error `data`).
//! Serializing borrows them, so an envelope is unchanged whether or not
//! serialization succeeds. Parsing moves the sub-documents out of the parsed
//! tree into the new envelope.
//!
//! # Request IDs
//!
//! An id correlates a response with its request. The protocol allows
//! string, number or null ids. On a [`Request`] the id is an `Option<Id>`:
//! `None` marks a notification, which is different from an explicit
//! `Id::Null`.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Request, Response};
//! use serde_json::json;
//!
//! let request = Request::with_id("sum", 99)
//!     .unwrap()
//!     .with_params(json!({"v": 5}))
//!     .unwrap();
//! assert_eq!(
//!     request.to_json().unwrap(),
//!     r#"{"jsonrpc":"2.0","id":99,"method":"sum","params":{"v":5}}"#
//! );
//!
//! let mut response = Response::for_request(&request).unwrap();
//! response.set_result(json!(5)).unwrap();
//! assert!(response.is_success());
//! ```

use crate::codec::{self, Codec};
use crate::error::{Error, ErrorObject, Result};
use crate::limits::{Limits, JSONRPC_VERSION, METHOD_NAME_MAX_LEN};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// JSON-RPC 2.0 request identifier
///
/// # Wire Encoding
///
/// - Strings are written as JSON strings
/// - `Null` is written as `null`
/// - Numbers that fit in 32 bits are written as JSON integers; wider
///   numbers are written as JSON doubles, so ids beyond 2^53 lose
///   precision on the wire
///
/// When reading, a double is accepted as a numeric id only if it lies within
/// the configured tolerance of an integer in the signed 64-bit range.
///
/// `Id` implements `Hash` and `Eq` so it can key a map of pending requests.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// assert_eq!(serde_json::to_string(&Id::Number(3_000_000_000)).unwrap(), "3000000000.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    /// Numeric identifier
    Number(i64),
    /// String identifier, non-empty in a valid envelope
    String(String),
    /// Explicit null identifier
    Null,
}

impl Id {
    /// The numeric value, if this is a numeric id
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Id::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string value, if this is a string id
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Id::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for `Id::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Id::Null)
    }

    fn validate_with(&self, limits: &Limits) -> Result<()> {
        match self {
            Id::String(s) if s.is_empty() => Err(Error::validation("string id must not be empty")),
            Id::String(s) if s.len() > limits.max_id_len => Err(Error::validation(format!(
                "string id exceeds {} bytes",
                limits.max_id_len
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Id::Number(n) => match i32::try_from(*n) {
                Ok(small) => serializer.serialize_i32(small),
                Err(_) => serializer.serialize_f64(*n as f64),
            },
            Id::String(s) => serializer.serialize_str(s),
            Id::Null => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        codec::extract_id(value, &Limits::default()).map_err(serde::de::Error::custom)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Number(n.into())
    }
}

impl From<u32> for Id {
    fn from(n: u32) -> Self {
        Id::Number(n.into())
    }
}

/// Accepts `Some(array)`, `Some(object)` or `None`
fn check_params(params: Option<&Value>) -> Result<()> {
    match params {
        None | Some(Value::Array(_)) | Some(Value::Object(_)) => Ok(()),
        Some(other) => Err(Error::validation(format!(
            "params must be an array or object, got {}",
            codec::json_type(other)
        ))),
    }
}

fn check_version(jsonrpc: &str) -> Result<()> {
    if jsonrpc != JSONRPC_VERSION {
        return Err(Error::validation(format!(
            "unsupported jsonrpc version {:?}",
            jsonrpc
        )));
    }
    Ok(())
}

/// JSON-RPC 2.0 request or notification
///
/// # Protocol Rules
///
/// A request MUST contain:
/// - `jsonrpc`: exactly "2.0"
/// - `method`: the name of the method to invoke
///
/// And MAY contain:
/// - `id`: absent for a notification
/// - `params`: an array or an object
///
/// Serialized key order is `jsonrpc`, `id`, `method`, `params`.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::Request;
/// use serde_json::json;
///
/// let notification = Request::new("status.update")
///     .unwrap()
///     .with_params(json!({"status": "online"}))
///     .unwrap();
/// assert!(notification.is_notification());
///
/// let call = Request::with_id("getServerTime", "time-1").unwrap();
/// assert!(!call.is_notification());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Protocol version, "2.0"
    pub jsonrpc: String,

    /// Correlation id; `None` for a notification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,

    /// Name of the remote method
    pub method: String,

    /// Optional parameters, an array or an object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Create a notification for `method`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` when `method` is empty or longer than
    /// 256 bytes.
    pub fn new(method: impl Into<String>) -> Result<Self> {
        let method = method.into();
        if method.is_empty() {
            return Err(Error::invalid_argument("method name must not be empty"));
        }
        if method.len() > METHOD_NAME_MAX_LEN {
            return Err(Error::invalid_argument(format!(
                "method name exceeds {} bytes",
                METHOD_NAME_MAX_LEN
            )));
        }
        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method,
            params: None,
        })
    }

    /// Create a request for `method` carrying `id`
    ///
    /// ```rust
    /// use jrpc_core::{Id, Request};
    ///
    /// let request = Request::with_id("ping", 1).unwrap();
    /// assert_eq!(request.id, Some(Id::Number(1)));
    /// ```
    pub fn with_id(method: impl Into<String>, id: impl Into<Id>) -> Result<Self> {
        let mut request = Self::new(method)?;
        request.id = Some(id.into());
        Ok(request)
    }

    /// Attach `params`, replacing any previous document
    pub fn with_params(mut self, params: Value) -> Result<Self> {
        self.set_params(Some(params))?;
        Ok(self)
    }

    /// Replace the id, turning a notification into a request
    pub fn set_id(&mut self, id: impl Into<Id>) {
        self.id = Some(id.into());
    }

    /// Drop the id, turning the request into a notification
    pub fn set_notification(&mut self) {
        self.id = None;
    }

    /// Replace or clear the params document
    ///
    /// Fails with `Error::Validation`, leaving the request unchanged, when
    /// `params` is neither an array nor an object.
    pub fn set_params(&mut self, params: Option<Value>) -> Result<()> {
        check_params(params.as_ref())?;
        self.params = params;
        Ok(())
    }

    /// True when the request carries no id
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Check the envelope against the default [`Limits`]
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&Limits::default())
    }

    /// Check the envelope against `limits`
    pub fn validate_with(&self, limits: &Limits) -> Result<()> {
        check_version(&self.jsonrpc)?;
        if self.method.is_empty() {
            return Err(Error::validation("method name must not be empty"));
        }
        if self.method.len() > limits.max_method_len {
            return Err(Error::validation(format!(
                "method name exceeds {} bytes",
                limits.max_method_len
            )));
        }
        check_params(self.params.as_ref())?;
        if let Some(id) = &self.id {
            id.validate_with(limits)?;
        }
        Ok(())
    }

    /// Parse a request from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        Codec::default().decode_request(text)
    }

    /// Build a request from an already parsed document
    pub fn from_value(value: Value) -> Result<Self> {
        codec::extract_request(value, &Limits::default())
    }

    /// Validate and serialize to JSON text
    pub fn to_json(&self) -> Result<String> {
        Codec::default().encode(self)
    }

    /// Validate and serialize into `buf`, returning the bytes written
    ///
    /// Returns `Error::Capacity` without touching `buf` when it is too small.
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<usize> {
        Codec::default().encode_into(self, buf)
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        codec::extract_request(value, &Limits::default()).map_err(serde::de::Error::custom)
    }
}

/// JSON-RPC 2.0 response
///
/// # Protocol Rules
///
/// A response MUST contain:
/// - `jsonrpc`: exactly "2.0"
/// - `id`: the id of the request it answers
/// - exactly one of `result` or `error`
///
/// A freshly created response carries neither. It becomes valid once
/// [`set_result`](Response::set_result) or [`set_error`](Response::set_error)
/// is called, and the two are mutually exclusive.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{ErrorObject, Response};
/// use serde_json::json;
///
/// let ok = Response::success(json!({"ok": true}), "abc123");
/// assert_eq!(ok.to_json().unwrap(), r#"{"jsonrpc":"2.0","id":"abc123","result":{"ok":true}}"#);
///
/// let mut failed = Response::new(7);
/// failed.set_error(ErrorObject::invalid_params()).unwrap();
/// assert!(failed.set_result(json!(1)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Protocol version, "2.0"
    pub jsonrpc: String,

    /// Id of the request being answered
    pub id: Id,

    /// Result document on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error object on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Create an empty response carrying `id`
    pub fn with_id(id: impl Into<Id>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            result: None,
            error: None,
        }
    }

    /// Create an empty response with a numeric id
    pub fn new(id: i64) -> Self {
        Self::with_id(id)
    }

    /// Create an empty response answering `request`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for a notification, which must never
    /// be answered.
    pub fn for_request(request: &Request) -> Result<Self> {
        match &request.id {
            Some(id) => Ok(Self::with_id(id.clone())),
            None => Err(Error::invalid_argument(format!(
                "notification {:?} cannot be answered",
                request.method
            ))),
        }
    }

    /// Create a successful response
    pub fn success(result: Value, id: impl Into<Id>) -> Self {
        let mut response = Self::with_id(id);
        response.result = Some(result);
        response
    }

    /// Create an error response
    pub fn failure(error: ErrorObject, id: impl Into<Id>) -> Self {
        let mut response = Self::with_id(id);
        response.error = Some(error);
        response
    }

    /// Attach the result document
    ///
    /// Fails with `Error::InvalidArgument` when a result or an error is
    /// already present.
    pub fn set_result(&mut self, result: Value) -> Result<()> {
        self.ensure_unanswered()?;
        self.result = Some(result);
        Ok(())
    }

    /// Attach the error object
    ///
    /// Fails with `Error::InvalidArgument` when a result or an error is
    /// already present.
    pub fn set_error(&mut self, error: ErrorObject) -> Result<()> {
        self.ensure_unanswered()?;
        self.error = Some(error);
        Ok(())
    }

    fn ensure_unanswered(&self) -> Result<()> {
        if self.result.is_some() {
            return Err(Error::invalid_argument("response already carries a result"));
        }
        if self.error.is_some() {
            return Err(Error::invalid_argument("response already carries an error"));
        }
        Ok(())
    }

    /// True when the response carries a result
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// True when the response carries an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Check the envelope against the default [`Limits`]
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&Limits::default())
    }

    /// Check the envelope against `limits`
    pub fn validate_with(&self, limits: &Limits) -> Result<()> {
        check_version(&self.jsonrpc)?;
        self.id.validate_with(limits)?;
        match (&self.result, &self.error) {
            (Some(_), None) => Ok(()),
            (None, Some(error)) => error.validate_with(limits),
            (Some(_), Some(_)) => Err(Error::validation(
                "response carries both result and error",
            )),
            (None, None) => Err(Error::validation(
                "response carries neither result nor error",
            )),
        }
    }

    /// Parse a response from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        Codec::default().decode_response(text)
    }

    /// Build a response from an already parsed document
    pub fn from_value(value: Value) -> Result<Self> {
        codec::extract_response(value, &Limits::default())
    }

    /// Validate and serialize to JSON text
    pub fn to_json(&self) -> Result<String> {
        Codec::default().encode(self)
    }

    /// Validate and serialize into `buf`, returning the bytes written
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<usize> {
        Codec::default().encode_into(self, buf)
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        codec::extract_response(value, &Limits::default()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("abc".into()).to_string(), "\"abc\"");
        assert_eq!(Id::Number(-4).to_string(), "-4");
        assert_eq!(Id::Null.to_string(), "null");
    }

    #[test]
    fn test_id_wire_encoding() {
        assert_eq!(serde_json::to_string(&Id::Number(2147483647)).unwrap(), "2147483647");
        assert_eq!(serde_json::to_string(&Id::Number(-2147483648)).unwrap(), "-2147483648");
        assert_eq!(serde_json::to_string(&Id::Number(2147483648)).unwrap(), "2147483648.0");
        assert_eq!(serde_json::to_string(&Id::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Id::from("x")).unwrap(), "\"x\"");
    }

    #[test]
    fn test_id_deserialize() {
        assert_eq!(serde_json::from_str::<Id>("7").unwrap(), Id::Number(7));
        assert_eq!(serde_json::from_str::<Id>("3.0").unwrap(), Id::Number(3));
        assert_eq!(serde_json::from_str::<Id>("null").unwrap(), Id::Null);
        assert!(serde_json::from_str::<Id>("1.5").is_err());
        assert!(serde_json::from_str::<Id>("true").is_err());
        assert!(serde_json::from_str::<Id>("\"\"").is_err());
    }

    #[test]
    fn test_id_accessors() {
        assert_eq!(Id::Number(5).as_number(), Some(5));
        assert_eq!(Id::from("a").as_str(), Some("a"));
        assert!(Id::Null.is_null());
        assert_eq!(Id::from(9u32), Id::Number(9));
        assert_eq!(Id::from(-9i32), Id::Number(-9));
    }

    #[test]
    fn test_request_constructor_rejects_bad_method() {
        assert!(matches!(Request::new(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            Request::new("m".repeat(257)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(Request::new("m".repeat(256)).is_ok());
    }

    #[test]
    fn test_notification_toggle() {
        let mut request = Request::new("tick").unwrap();
        assert!(request.is_notification());

        request.set_id("t-1");
        assert_eq!(request.id, Some(Id::String("t-1".into())));

        request.set_notification();
        assert!(request.is_notification());
    }

    #[test]
    fn test_set_params_rejects_scalars() {
        let mut request = Request::with_id("sum", 1).unwrap();
        request.set_params(Some(json!([1, 2]))).unwrap();

        let result = request.set_params(Some(json!(42)));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(request.params, Some(json!([1, 2])));

        request.set_params(None).unwrap();
        assert!(request.params.is_none());
    }

    #[test]
    fn test_request_serialization_key_order() {
        let request = Request::with_id("sum", 99)
            .unwrap()
            .with_params(json!({"v": 5}))
            .unwrap();
        assert_eq!(
            request.to_json().unwrap(),
            r#"{"jsonrpc":"2.0","id":99,"method":"sum","params":{"v":5}}"#
        );

        let notification = Request::new("ping").unwrap();
        assert_eq!(notification.to_json().unwrap(), r#"{"jsonrpc":"2.0","method":"ping"}"#);
    }

    #[test]
    fn test_request_validate_catches_mutation() {
        let mut request = Request::with_id("ok", 1).unwrap();
        request.method.clear();
        assert!(matches!(request.validate(), Err(Error::Validation(_))));

        let mut request = Request::with_id("ok", 1).unwrap();
        request.jsonrpc = "1.0".into();
        assert!(matches!(request.to_json(), Err(Error::Validation(_))));

        let mut request = Request::new("ok").unwrap();
        request.id = Some(Id::String(String::new()));
        assert!(request.validate().is_err());

        let mut request = Request::new("ok").unwrap();
        request.params = Some(json!("scalar"));
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_response_for_notification_rejected() {
        let notification = Request::new("event").unwrap();
        assert!(matches!(
            Response::for_request(&notification),
            Err(Error::InvalidArgument(_))
        ));

        let request = Request::with_id("call", "c-1").unwrap();
        let response = Response::for_request(&request).unwrap();
        assert_eq!(response.id, Id::String("c-1".into()));
    }

    #[test]
    fn test_result_error_mutual_exclusion() {
        let mut response = Response::new(1);
        response.set_result(json!("done")).unwrap();
        assert!(matches!(
            response.set_error(ErrorObject::internal_error()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            response.set_result(json!("again")),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(response.result, Some(json!("done")));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_response_validate_requires_outcome() {
        let response = Response::new(1);
        assert!(matches!(response.validate(), Err(Error::Validation(_))));

        let mut both = Response::success(json!(1), 1);
        both.error = Some(ErrorObject::internal_error());
        assert!(matches!(both.to_json(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_null_result_is_a_result() {
        let response = Response::success(Value::Null, Id::Null);
        assert!(response.is_success());
        assert_eq!(
            response.to_json().unwrap(),
            r#"{"jsonrpc":"2.0","id":null,"result":null}"#
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorObject::new(-32602, "Invalid params")
            .unwrap()
            .with_data(json!({"detail": "missing"}));
        let response = Response::failure(error, 3);
        assert_eq!(
            response.to_json().unwrap(),
            r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32602,"message":"Invalid params","data":{"detail":"missing"}}}"#
        );
    }

    #[test]
    fn test_serde_from_str_validates() {
        let request: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"a","id":"x"}"#).unwrap();
        assert_eq!(request.method, "a");

        assert!(serde_json::from_str::<Request>(r#"{"jsonrpc":"1.0","method":"a"}"#).is_err());
        assert!(serde_json::from_str::<Response>(r#"{"jsonrpc":"2.0","result":1}"#).is_err());
    }
}

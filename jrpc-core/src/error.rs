//! Error types for jrpc
//!
//! Two distinct things are called "error" in a JSON-RPC library, and this
//! module keeps them apart:
//!
//! - **Error**: a failure of a jrpc operation (bad input, invalid envelope,
//!   buffer too small). Returned through `Result`.
//! - **ErrorObject**: the `error` member of a response. This is protocol
//!   data, carried inside a [`Response`](crate::Response) like any result.
//!
//! # Failure Taxonomy
//!
//! - `InvalidArgument`: the caller broke an API contract (empty method name,
//!   setting a result twice, answering a notification). Checked before any
//!   side effect.
//! - `Validation`: a document violates a JSON-RPC structural rule.
//! - `Allocation`: memory for a batch could not be reserved.
//! - `Parse` / `Serialization`: passed through from `serde_json`.
//! - `Capacity`: a fixed-size output buffer is too small.
//!
//! # Standard Error Codes
//!
//! - `-32700`: Parse error
//! - `-32600`: Invalid Request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32099 to -32000`: Server error (implementation-defined)
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{ErrorCode, ErrorObject};
//!
//! let error = ErrorObject::method_not_found("unknownMethod");
//! assert_eq!(error.code, -32601);
//! assert_eq!(error.error_code(), ErrorCode::MethodNotFound);
//! ```

use crate::codec::{self, Codec};
use crate::limits::Limits;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for jrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Parse error code
pub const PARSE_ERROR: i32 = -32700;
/// Invalid Request code
pub const INVALID_REQUEST: i32 = -32600;
/// Method not found code
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid params code
pub const INVALID_PARAMS: i32 = -32602;
/// Internal error code
pub const INTERNAL_ERROR: i32 = -32603;
/// Lowest code of the server-reserved range
pub const SERVER_ERROR_MIN: i32 = -32099;
/// Highest code of the server-reserved range
pub const SERVER_ERROR_MAX: i32 = -32000;

/// Failure of a jrpc operation
///
/// Every fallible function in the crate returns this type. No operation
/// leaves a partially built value behind when it fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The caller violated an API contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The document violates a JSON-RPC structural rule
    #[error("Validation error: {0}")]
    Validation(String),

    /// Memory could not be reserved for a batch
    #[error("Allocation error: {0}")]
    Allocation(String),

    /// The input is not well-formed JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// The JSON writer failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The caller-supplied output buffer is too small
    #[error("Output buffer too small: required={required}, available={available}")]
    Capacity {
        /// Bytes needed for the serialized document
        required: usize,
        /// Bytes offered by the caller
        available: usize,
    },
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Prefix the message with the batch position that produced it
    pub(crate) fn at_index(self, index: usize) -> Self {
        match self {
            Error::Validation(msg) => Error::Validation(format!("batch item {}: {}", index, msg)),
            Error::InvalidArgument(msg) => {
                Error::InvalidArgument(format!("batch item {}: {}", index, msg))
            }
            other => other,
        }
    }

    /// True for [`Error::Validation`]
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// True for [`Error::InvalidArgument`]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Validation(_) => "validation",
            Error::Allocation(_) => "allocation",
            Error::Parse(_) => "parse",
            Error::Serialization(_) => "serialization",
            Error::Capacity { .. } => "capacity",
        }
    }

    /// Wire error a server would answer with for this failure
    ///
    /// Parse failures map to `-32700`, structural failures to `-32600` and
    /// everything else to `-32603`. The failure text is attached as `data`.
    ///
    /// ```rust
    /// use jrpc_core::{codec, ErrorCode};
    ///
    /// let err = codec::decode("{not json").unwrap_err();
    /// assert_eq!(err.to_error_object().error_code(), ErrorCode::ParseError);
    /// ```
    pub fn to_error_object(&self) -> ErrorObject {
        let detail = match self {
            Error::InvalidArgument(msg)
            | Error::Validation(msg)
            | Error::Allocation(msg)
            | Error::Parse(msg)
            | Error::Serialization(msg) => msg.clone(),
            Error::Capacity { .. } => self.to_string(),
        };
        let base = match self {
            Error::Parse(_) => ErrorObject::parse_error(),
            Error::Validation(_) | Error::InvalidArgument(_) => ErrorObject::invalid_request(),
            _ => ErrorObject::internal_error(),
        };
        base.with_data(Value::String(detail))
    }
}

/// Standard JSON-RPC 2.0 error codes
///
/// Codes in `[-32099, -32000]` are reserved for implementation-defined
/// server errors; every other code outside the predefined set is
/// application-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `-32700`: invalid JSON was received
    ParseError,
    /// `-32600`: the JSON is not a valid request object
    InvalidRequest,
    /// `-32601`: the method does not exist or is unavailable
    MethodNotFound,
    /// `-32602`: invalid method parameters
    InvalidParams,
    /// `-32603`: internal JSON-RPC error
    InternalError,
    /// `-32099..=-32000`: implementation-defined server error
    ServerError(i32),
    /// Any other code
    Application(i32),
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => PARSE_ERROR,
            ErrorCode::InvalidRequest => INVALID_REQUEST,
            ErrorCode::MethodNotFound => METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => INVALID_PARAMS,
            ErrorCode::InternalError => INTERNAL_ERROR,
            ErrorCode::ServerError(code) | ErrorCode::Application(code) => code,
        }
    }

    /// Canonical message for the code
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ServerError(_) => "Server error",
            ErrorCode::Application(_) => "Application error",
        }
    }

    /// True when `code` lies in the server-reserved range
    pub fn is_server_error(code: i32) -> bool {
        (SERVER_ERROR_MIN..=SERVER_ERROR_MAX).contains(&code)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        match code {
            PARSE_ERROR => ErrorCode::ParseError,
            INVALID_REQUEST => ErrorCode::InvalidRequest,
            METHOD_NOT_FOUND => ErrorCode::MethodNotFound,
            INVALID_PARAMS => ErrorCode::InvalidParams,
            INTERNAL_ERROR => ErrorCode::InternalError,
            code if ErrorCode::is_server_error(code) => ErrorCode::ServerError(code),
            code => ErrorCode::Application(code),
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// The `error` member of a JSON-RPC 2.0 response
///
/// # Protocol Rules
///
/// An error object MUST contain:
/// - `code`: an integer
/// - `message`: a short description, never empty
///
/// And MAY contain:
/// - `data`: any additional JSON value
///
/// The object owns its `data` document. Attaching new data drops the
/// previous document.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::ErrorObject;
/// use serde_json::json;
///
/// let error = ErrorObject::new(1001, "Insufficient funds")
///     .unwrap()
///     .with_data(json!({"balance": 50, "required": 100}));
///
/// assert_eq!(error.data.as_ref().unwrap()["balance"], 50);
/// assert!(ErrorObject::new(1001, "").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    /// Numeric error code
    pub code: i32,

    /// Human-readable description
    pub message: String,

    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// Create an error object
    ///
    /// Fails with [`Error::InvalidArgument`] when `message` is empty.
    pub fn new(code: i32, message: impl Into<String>) -> Result<Self> {
        let message = message.into();
        if message.is_empty() {
            return Err(Error::invalid_argument("error message must not be empty"));
        }
        Ok(Self {
            code,
            message,
            data: None,
        })
    }

    /// Create an error object carrying the canonical message for `code`
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data: None,
        }
    }

    /// `-32700` Parse error
    pub fn parse_error() -> Self {
        Self::from_code(ErrorCode::ParseError)
    }

    /// `-32600` Invalid Request
    pub fn invalid_request() -> Self {
        Self::from_code(ErrorCode::InvalidRequest)
    }

    /// `-32601` Method not found, naming the missing method
    ///
    /// ```rust
    /// use jrpc_core::ErrorObject;
    ///
    /// let error = ErrorObject::method_not_found("calculateFoo");
    /// assert_eq!(error.message, "Method not found: calculateFoo");
    /// ```
    pub fn method_not_found(method: impl AsRef<str>) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method.as_ref()),
            data: None,
        }
    }

    /// `-32602` Invalid params
    pub fn invalid_params() -> Self {
        Self::from_code(ErrorCode::InvalidParams)
    }

    /// `-32603` Internal error
    pub fn internal_error() -> Self {
        Self::from_code(ErrorCode::InternalError)
    }

    /// Implementation-defined server error
    ///
    /// `code` must lie in `[-32099, -32000]`.
    pub fn server_error(code: i32, message: impl Into<String>) -> Result<Self> {
        if !ErrorCode::is_server_error(code) {
            return Err(Error::invalid_argument(format!(
                "server error code {} outside [{}, {}]",
                code, SERVER_ERROR_MIN, SERVER_ERROR_MAX
            )));
        }
        Self::new(code, message)
    }

    /// Attach `data`, replacing any previous document
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Replace or clear the data document
    pub fn set_data(&mut self, data: Option<Value>) {
        self.data = data;
    }

    /// Classified error code
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self.code)
    }

    /// Check the object against the default [`Limits`]
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&Limits::default())
    }

    /// Check the object against `limits`
    ///
    /// Fails with [`Error::Validation`] when the message is empty or longer
    /// than `limits.max_error_message_len` bytes.
    pub fn validate_with(&self, limits: &Limits) -> Result<()> {
        if self.message.is_empty() {
            return Err(Error::validation("error message must not be empty"));
        }
        if self.message.len() > limits.max_error_message_len {
            return Err(Error::validation(format!(
                "error message exceeds {} bytes",
                limits.max_error_message_len
            )));
        }
        Ok(())
    }

    /// Parse a standalone error object from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        Codec::default().decode_error_object(text)
    }
}

impl<'de> Deserialize<'de> for ErrorObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        codec::extract_error_object(value, &Default::default()).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for ErrorObject {
    /// Formats as "[code] message"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorObject {}

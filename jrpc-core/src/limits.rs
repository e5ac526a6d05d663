//! Protocol constants and wire input limits
//!
//! JSON-RPC 2.0 itself puts no bound on the size of a method name, an error
//! message or a string identifier. This crate does, so that a single hostile
//! document cannot force arbitrarily large strings into an envelope. The
//! ceilings are enforced as validation rules during extraction and, for
//! method names, again when an envelope is validated before serialization.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Codec, Limits};
//!
//! let limits = Limits::default()
//!     .with_max_method_len(1024)
//!     .with_id_tolerance(0.0);
//!
//! let codec = Codec::new(limits);
//! assert_eq!(codec.limits().max_method_len, 1024);
//! ```

/// Protocol version carried in every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Maximum method name length in bytes
pub const METHOD_NAME_MAX_LEN: usize = 256;

/// Maximum error message length in bytes when read from the wire
pub const ERROR_MESSAGE_MAX_LEN: usize = 4096;

/// Maximum string identifier length in bytes when read from the wire
pub const ID_STRING_MAX_LEN: usize = 8192;

/// Accepted distance between a floating point id and the nearest integer
///
/// Kept for compatibility with peers that encode large integer ids as
/// doubles. There is nothing special about the value itself.
pub const ID_INTEGER_TOLERANCE: f64 = 1e-10;

/// Size and precision limits applied by a [`Codec`](crate::Codec)
///
/// The defaults match the crate constants. Use the builder methods to
/// relax or tighten them for a particular deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Longest accepted method name, in bytes
    pub max_method_len: usize,

    /// Longest accepted error message, in bytes
    pub max_error_message_len: usize,

    /// Longest accepted string identifier, in bytes
    pub max_id_len: usize,

    /// Tolerance used when a numeric id arrives as a double
    pub id_tolerance: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_method_len: METHOD_NAME_MAX_LEN,
            max_error_message_len: ERROR_MESSAGE_MAX_LEN,
            max_id_len: ID_STRING_MAX_LEN,
            id_tolerance: ID_INTEGER_TOLERANCE,
        }
    }
}

impl Limits {
    /// Create limits with the default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the longest accepted method name
    pub fn with_max_method_len(mut self, len: usize) -> Self {
        self.max_method_len = len;
        self
    }

    /// Set the longest accepted error message
    pub fn with_max_error_message_len(mut self, len: usize) -> Self {
        self.max_error_message_len = len;
        self
    }

    /// Set the longest accepted string identifier
    pub fn with_max_id_len(mut self, len: usize) -> Self {
        self.max_id_len = len;
        self
    }

    /// Set the tolerance for double-encoded numeric ids
    ///
    /// Negative values are treated as zero.
    pub fn with_id_tolerance(mut self, tolerance: f64) -> Self {
        self.id_tolerance = tolerance.max(0.0);
        self
    }
}

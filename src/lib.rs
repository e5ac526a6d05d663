//! jrpc - typed, validated JSON-RPC 2.0 envelopes
//!
//! This is the convenience crate that re-exports `jrpc-core`. Depend on it
//! for a single `jrpc::` prefix over requests, responses, batches and the
//! codec.
//!
//! # Quick Start - Answering a Request
//!
//! ```rust
//! use jrpc::{Codec, ErrorObject, Message, Response};
//!
//! let codec = Codec::default();
//! let incoming = r#"{"jsonrpc":"2.0","id":"abc123","method":"lookup","params":["k"]}"#;
//!
//! let reply = match codec.decode(incoming) {
//!     Ok(Message::Request(request)) if !request.is_notification() => {
//!         let mut response = Response::for_request(&request).unwrap();
//!         response
//!             .set_error(ErrorObject::method_not_found(&request.method))
//!             .unwrap();
//!         Some(response)
//!     }
//!     Ok(_) => None,
//!     Err(err) => Some(Response::failure(err.to_error_object(), jrpc::Id::Null)),
//! };
//!
//! let text = codec.encode(&reply.unwrap()).unwrap();
//! assert!(text.contains(r#""code":-32601"#));
//! ```
//!
//! # Quick Start - Sorting Incoming Traffic
//!
//! ```rust
//! use jrpc::{codec, MessageKind};
//!
//! let kind = codec::peek_kind(r#"[{"jsonrpc":"2.0","id":1,"result":"ok"}]"#).unwrap();
//! assert_eq!(kind, MessageKind::ResponseBatch);
//! ```

pub use jrpc_core as core;

pub use jrpc_core::{
    codec, detect_kind, Batch, Codec, Error, ErrorCode, ErrorObject, Id, Limits, Message,
    MessageKind, Request, RequestBatch, Response, ResponseBatch, Result,
};

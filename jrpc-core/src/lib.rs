//! Core JSON-RPC 2.0 envelopes, codec and message detection for jrpc
//!
//! This crate turns self-contained JSON-RPC 2.0 documents into typed,
//! validated Rust values and back. It includes:
//!
//! - **Types**: [`Id`], [`Request`], [`Response`], [`ErrorObject`]
//! - **Batches**: [`Batch`], with [`RequestBatch`] and [`ResponseBatch`]
//! - **Detection**: [`detect_kind`] and the [`Message`] sum type
//! - **Codec**: validation, serialization and extraction bound to [`Limits`]
//! - **Error handling**: one [`Error`] type for every failure
//! - **Observability**: `tracing` events, OpenTelemetry metrics and setup
//!
//! # Architecture
//!
//! The crate is transport-agnostic. It never opens a socket or dispatches a
//! method; it only reads and writes documents. JSON itself is handled by
//! `serde_json`: a parsed document is a `serde_json::Value`, and envelope
//! sub-documents (`params`, `result`, error `data`) are owned `Value`s.
//!
//! # Example
//!
//! ```rust
//! use jrpc_core::{codec, Message, Request, Response};
//! use serde_json::json;
//!
//! let request = Request::with_id("sum", 99)
//!     .unwrap()
//!     .with_params(json!({"v": 5}))
//!     .unwrap();
//! let json = codec::encode_request(&request).unwrap();
//!
//! match codec::decode(&json).unwrap() {
//!     Message::Request(decoded) => {
//!         let mut reply = Response::for_request(&decoded).unwrap();
//!         reply.set_result(json!(5)).unwrap();
//!         assert_eq!(
//!             reply.to_json().unwrap(),
//!             r#"{"jsonrpc":"2.0","id":99,"result":5}"#
//!         );
//!     }
//!     other => panic!("unexpected {:?}", other.kind()),
//! }
//! ```

pub mod batch;
pub mod codec;
pub mod error;
pub mod limits;
pub mod message;
pub mod metrics;
pub mod observability;
pub mod types;

pub use batch::{Batch, RequestBatch, ResponseBatch};
pub use codec::{BatchItem, Codec, Envelope};
pub use error::{Error, ErrorCode, ErrorObject, Result};
pub use limits::{Limits, JSONRPC_VERSION};
pub use message::{detect_kind, Message, MessageKind};
pub use metrics::CodecMetrics;
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, Request, Response};

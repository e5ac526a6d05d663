//! Codec metrics definitions
//!
//! This module defines OpenTelemetry metrics for watching what a [`Codec`]
//! reads and writes. Metrics are exported through whatever meter provider is
//! installed, typically the one set up by
//! [`init_observability`](crate::init_observability).
//!
//! # Metrics Collected
//!
//! - **messages_parsed**: Documents successfully parsed, by kind (counter)
//! - **messages_serialized**: Documents successfully serialized, by kind (counter)
//! - **batch_size**: Number of items in parsed or serialized batches (histogram)
//! - **errors_total**: Rejected documents, by failure kind and operation (counter)
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Codec, CodecMetrics, Request};
//!
//! let codec = Codec::default().with_metrics(CodecMetrics::new());
//! let json = codec.encode(&Request::with_id("ping", 1).unwrap()).unwrap();
//! codec.decode(&json).unwrap();
//! ```
//!
//! [`Codec`]: crate::Codec

use crate::message::MessageKind;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Instrumentation scope used when no meter is supplied
pub const METER_NAME: &str = "jrpc";

/// Codec metrics for monitoring
///
/// All metrics are prefixed with `jrpc.codec.*`.
pub struct CodecMetrics {
    /// Documents parsed
    pub messages_parsed: Counter<u64>,
    /// Documents serialized
    pub messages_serialized: Counter<u64>,
    /// Batch size distribution
    pub batch_size: Histogram<u64>,
    /// Rejected documents
    pub errors_total: Counter<u64>,
}

impl CodecMetrics {
    /// Create instruments on the global meter provider
    pub fn new() -> Self {
        let meter = global::meter(METER_NAME);
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            messages_parsed: meter
                .u64_counter("jrpc.codec.messages.parsed")
                .with_description("Number of JSON-RPC documents parsed")
                .build(),
            messages_serialized: meter
                .u64_counter("jrpc.codec.messages.serialized")
                .with_description("Number of JSON-RPC documents serialized")
                .build(),
            batch_size: meter
                .u64_histogram("jrpc.codec.batch.size")
                .with_description("Number of items in batch documents")
                .build(),
            errors_total: meter
                .u64_counter("jrpc.codec.errors.total")
                .with_description("Number of rejected documents")
                .build(),
        }
    }

    /// Record a parsed document
    pub fn record_parsed(&self, kind: MessageKind, items: usize) {
        let attributes = &[KeyValue::new("kind", kind.as_str())];
        self.messages_parsed.add(1, attributes);
        if kind.is_batch() {
            self.batch_size.record(items as u64, attributes);
        }
    }

    /// Record a serialized document
    pub fn record_serialized(&self, kind: MessageKind, items: usize) {
        let attributes = &[KeyValue::new("kind", kind.as_str())];
        self.messages_serialized.add(1, attributes);
        if kind.is_batch() {
            self.batch_size.record(items as u64, attributes);
        }
    }

    /// Record a rejected document
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        self.errors_total.add(
            1,
            &[
                KeyValue::new("error_type", error_type),
                KeyValue::new("operation", operation),
            ],
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

//! Batch containers
//!
//! JSON-RPC 2.0 allows several requests, or several responses, to travel in
//! one JSON array. A [`Batch`] keeps the items in wire order.
//!
//! # Atomicity
//!
//! Parsing a batch is all-or-nothing. The first element that fails to
//! extract aborts the whole parse, the items already built are dropped, and
//! the error names the failing position. Serializing validates every item
//! before any text is produced.
//!
//! # Empty Batches
//!
//! Dedicated batch parsing accepts `[]` and returns an empty batch. Message
//! level parsing (see [`Message`](crate::Message)) rejects `[]` because its
//! kind cannot be determined.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Request, RequestBatch};
//!
//! let batch: RequestBatch = vec![
//!     Request::with_id("a", 1).unwrap(),
//!     Request::new("b").unwrap(),
//! ]
//! .into();
//!
//! let json = batch.to_json().unwrap();
//! let parsed = RequestBatch::parse(&json).unwrap();
//! assert_eq!(parsed.len(), 2);
//! assert!(parsed[1].is_notification());
//! ```

use crate::codec::{self, BatchItem, Codec, Envelope};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::types::{Request, Response};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::ops::Index;

/// Ordered collection of envelopes sent as one JSON array
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Batch<T> {
    items: Vec<T>,
}

/// Batch of requests and notifications
pub type RequestBatch = Batch<Request>;

/// Batch of responses
pub type ResponseBatch = Batch<Response>;

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Batch<T> {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the batch holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the items in wire order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Borrow the items
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Take the items out of the batch
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Append an item
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }
}

impl<T: BatchItem> Batch<T> {
    /// Parse a batch from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        Codec::default().decode_as(text)
    }

    /// Build a batch from an already parsed document
    pub fn from_value(value: Value) -> Result<Self> {
        Self::extract(value, &Limits::default())
    }

    /// Validate every item and serialize to a JSON array
    pub fn to_json(&self) -> Result<String> {
        Codec::default().encode(self)
    }

    /// Validate every item and serialize into `buf`
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<usize> {
        Codec::default().encode_into(self, buf)
    }

    /// Check every item against the default [`Limits`]
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&Limits::default())
    }
}

impl<T: BatchItem> Envelope for Batch<T> {
    fn kind(&self) -> crate::MessageKind {
        T::BATCH_KIND
    }

    fn item_count(&self) -> usize {
        self.len()
    }

    fn validate_with(&self, limits: &Limits) -> Result<()> {
        validate_items(&self.items, limits)
    }

    fn extract(value: Value, limits: &Limits) -> Result<Self> {
        let elements = match value {
            Value::Array(elements) => elements,
            other => {
                return Err(Error::validation(format!(
                    "batch must be a JSON array, got {}",
                    codec::json_type(&other)
                )))
            }
        };

        let mut items = Vec::new();
        items.try_reserve_exact(elements.len()).map_err(|e| {
            Error::Allocation(format!("cannot reserve {} batch items: {}", elements.len(), e))
        })?;

        for (index, element) in elements.into_iter().enumerate() {
            items.push(T::extract(element, limits).map_err(|e| e.at_index(index))?);
        }
        Ok(Self { items })
    }
}

/// Validate each item, naming the first failing position
pub(crate) fn validate_items<T: Envelope>(items: &[T], limits: &Limits) -> Result<()> {
    items
        .iter()
        .enumerate()
        .try_for_each(|(index, item)| item.validate_with(limits).map_err(|e| e.at_index(index)))
}

impl<'de, T: BatchItem> Deserialize<'de> for Batch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::extract(value, &Limits::default()).map_err(serde::de::Error::custom)
    }
}

impl<T> Index<usize> for Batch<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> From<Vec<T>> for Batch<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Batch<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Batch<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Batch<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

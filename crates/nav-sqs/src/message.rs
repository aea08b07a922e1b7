//! Message types for queue operations including batch correlation identifiers.

use crate::error::{BatchErrorRecord, ValidationError};
use crate::queue::Queue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Per-call correlation identifier of a message inside a batch send
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchId(String);

impl BatchId {
    /// Create new batch id; blank ids are rejected
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "batch_id".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Batch id for the n-th automatically numbered message
    pub(crate) fn sequential(n: usize) -> Self {
        Self(n.to_string())
    }

    /// Get batch id as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BatchId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BatchId> for String {
    fn from(id: BatchId) -> Self {
        id.0
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// A named string value carried by a message.
///
/// The owning message is the one whose `attributes` contain it; the queue is
/// referenced by URL only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub queue_url: String,
    pub name: String,
    pub value: String,
}

// ============================================================================
// Messages
// ============================================================================

/// A unit of payload bound to a queue, with delivery parameters and the
/// outcome of its last send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Destination queue. A copy of the identifiers, not shared state.
    pub queue: Queue,
    pub body: String,
    pub delay_seconds: u32,
    /// Correlation id within a batch send; assigned by the send when unset
    pub batch_id: Option<BatchId>,
    /// Message id reported by the service after a successful send
    pub aws_assigned_id: Option<String>,
    pub receipt_handle: Option<String>,
    /// Per-message failure reported by a batch send
    pub error: Option<BatchErrorRecord>,
    pub attributes: Vec<Attribute>,
}

impl Message {
    /// Create a new message for the given queue
    pub fn new(queue: &Queue, body: impl Into<String>) -> Self {
        Self {
            queue: queue.clone(),
            body: body.into(),
            delay_seconds: 0,
            batch_id: None,
            aws_assigned_id: None,
            receipt_handle: None,
            error: None,
            attributes: Vec::new(),
        }
    }

    /// Set the delivery delay
    pub fn with_delay_seconds(mut self, delay_seconds: u32) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    /// Preset the batch correlation id
    pub fn with_batch_id(mut self, batch_id: BatchId) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    /// Attach a string attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            queue_url: self.queue.url.clone(),
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Outcome of the last send, as far as the service reported it
    pub fn outcome(&self) -> MessageOutcome<'_> {
        match (&self.aws_assigned_id, &self.error) {
            (Some(id), _) => MessageOutcome::Sent(id),
            (None, Some(error)) => MessageOutcome::Failed(error),
            (None, None) => MessageOutcome::Unknown,
        }
    }

    /// Forget the outcome of a previous send
    pub(crate) fn reset_outcome(&mut self) {
        self.aws_assigned_id = None;
        self.error = None;
    }
}

/// Tri-state view of a message's send outcome.
///
/// `Unknown` covers both "never sent" and "sent in a batch whose response did
/// not mention it"; it is never reported as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome<'a> {
    Sent(&'a str),
    Failed(&'a BatchErrorRecord),
    Unknown,
}

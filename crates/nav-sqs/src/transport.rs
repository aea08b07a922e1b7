//! The minimal queueing transport contract the client is built on.
//!
//! A transport performs exactly one remote exchange per call and knows nothing
//! about [`Message`](crate::message::Message) objects, batching rules or
//! correlation. Concrete implementations live in [`crate::providers`].

use crate::credentials::Credentials;
use crate::error::SqsError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A string-typed message attribute as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAttribute {
    pub name: String,
    pub value: String,
}

/// Single message submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub queue_url: String,
    pub body: String,
    pub delay_seconds: u32,
    pub attributes: Vec<WireAttribute>,
}

/// One entry of a batched submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequestEntry {
    pub id: String,
    pub body: String,
    pub delay_seconds: u32,
    pub attributes: Vec<WireAttribute>,
}

/// Successful entry of a batch response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResultEntry {
    pub id: String,
    pub message_id: String,
}

/// Failed entry of a batch response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResultErrorEntry {
    pub id: String,
    pub code: String,
    pub message: String,
    pub sender_fault: String,
}

/// Per-entry results of a batched submission, in whatever order the service
/// reported them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    pub successes: Vec<BatchResultEntry>,
    pub failures: Vec<BatchResultErrorEntry>,
}

/// Interface implemented by concrete queue transports (HTTP, in-memory)
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// URLs of every queue visible to the credentials, in service order
    async fn list_queues(&self) -> Result<Vec<String>, SqsError>;

    /// Create a queue; `None` when the service did not report a URL
    async fn create_queue(
        &self,
        name: &str,
        visibility_timeout_seconds: u32,
        delay_seconds: u32,
    ) -> Result<Option<String>, SqsError>;

    /// Send one message and return the service-assigned message id
    async fn send_message(&self, request: &SendMessageRequest) -> Result<String, SqsError>;

    /// Send up to ten entries to one queue in a single request
    async fn send_message_batch(
        &self,
        queue_url: &str,
        entries: &[BatchRequestEntry],
    ) -> Result<BatchResponse, SqsError>;
}

/// Opens a fresh transport for a set of credentials
pub trait TransportFactory: Send + Sync {
    fn open(&self, credentials: &Credentials) -> Result<Box<dyn QueueTransport>, SqsError>;
}

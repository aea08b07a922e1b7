//! In-memory queue transport for testing and development.
//!
//! Behaves like a small SQS account held in process memory:
//! - Queue URLs have the form `memory://{account}/{name}`
//! - Creating an existing queue returns its URL again
//! - Sends assign random message ids
//! - Batch entries that SQS would reject are reported as per-entry failures
//! - Sending to an unknown queue URL fails the whole call
//!
//! Transports opened from one [`InMemoryTransportFactory`] share storage, so a
//! queue created through one call is visible to the next.

use crate::credentials::Credentials;
use crate::error::SqsError;
use crate::transport::{
    BatchRequestEntry, BatchResponse, BatchResultEntry, BatchResultErrorEntry, QueueTransport,
    SendMessageRequest, TransportFactory, WireAttribute,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Largest message body accepted, in bytes
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// Largest per-message delivery delay accepted, in seconds
pub const MAX_DELAY_SECONDS: u32 = 900;

const NON_EXISTENT_QUEUE: &str = "AWS.SimpleQueueService.NonExistentQueue";

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// A message accepted by a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub message_id: String,
    pub body: String,
    pub delay_seconds: u32,
    pub attributes: Vec<WireAttribute>,
}

#[derive(Debug)]
struct InMemoryQueue {
    url: String,
    visibility_timeout_seconds: u32,
    delay_seconds: u32,
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Default)]
struct QueueStorage {
    /// Queues in creation order, which is also listing order
    queues: Vec<InMemoryQueue>,
}

impl QueueStorage {
    fn queue(&self, url: &str) -> Result<&InMemoryQueue, SqsError> {
        self.queues
            .iter()
            .find(|q| q.url.eq_ignore_ascii_case(url))
            .ok_or_else(non_existent_queue)
    }

    fn queue_mut(&mut self, url: &str) -> Result<&mut InMemoryQueue, SqsError> {
        self.queues
            .iter_mut()
            .find(|q| q.url.eq_ignore_ascii_case(url))
            .ok_or_else(non_existent_queue)
    }
}

fn non_existent_queue() -> SqsError {
    SqsError::Service {
        error_type: "Sender".to_string(),
        code: NON_EXISTENT_QUEUE.to_string(),
        message: "The specified queue does not exist for this wsdl version.".to_string(),
        request_id: None,
        status_code: 400,
    }
}

fn lock_poisoned() -> SqsError {
    SqsError::Network("In-memory queue storage lock poisoned".to_string())
}

/// Reason SQS would refuse an entry, as `(code, message)`
fn entry_rejection(body: &str, delay_seconds: u32) -> Option<(&'static str, String)> {
    if body.is_empty() {
        return Some(("EmptyValue", "The message body must not be empty.".to_string()));
    }
    if body.len() > MAX_BODY_BYTES {
        return Some((
            "InvalidParameterValue",
            format!(
                "Message must be shorter than {} bytes ({} given).",
                MAX_BODY_BYTES,
                body.len()
            ),
        ));
    }
    if delay_seconds > MAX_DELAY_SECONDS {
        return Some((
            "InvalidParameterValue",
            format!(
                "DelaySeconds must be between 0 and {} ({} given).",
                MAX_DELAY_SECONDS, delay_seconds
            ),
        ));
    }
    None
}

// ============================================================================
// Transport
// ============================================================================

/// In-memory transport sharing storage with its factory
#[derive(Debug, Clone)]
pub struct InMemoryTransport {
    account: String,
    storage: Arc<RwLock<QueueStorage>>,
}

impl InMemoryTransport {
    /// Create a transport with its own empty storage
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            storage: Arc::new(RwLock::new(QueueStorage::default())),
        }
    }

    /// Messages accepted so far by the queue at `url`
    pub fn messages(&self, url: &str) -> Result<Vec<StoredMessage>, SqsError> {
        let storage = self.storage.read().map_err(|_| lock_poisoned())?;
        Ok(storage.queue(url)?.messages.clone())
    }

    /// Visibility timeout and delay the queue at `url` was created with
    pub fn queue_settings(&self, url: &str) -> Result<(u32, u32), SqsError> {
        let storage = self.storage.read().map_err(|_| lock_poisoned())?;
        let queue = storage.queue(url)?;
        Ok((queue.visibility_timeout_seconds, queue.delay_seconds))
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new("000000000000")
    }
}

#[async_trait]
impl QueueTransport for InMemoryTransport {
    async fn list_queues(&self) -> Result<Vec<String>, SqsError> {
        let storage = self.storage.read().map_err(|_| lock_poisoned())?;
        Ok(storage.queues.iter().map(|q| q.url.clone()).collect())
    }

    async fn create_queue(
        &self,
        name: &str,
        visibility_timeout_seconds: u32,
        delay_seconds: u32,
    ) -> Result<Option<String>, SqsError> {
        if name.is_empty()
            || name.len() > 80
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SqsError::Service {
                error_type: "Sender".to_string(),
                code: "InvalidParameterValue".to_string(),
                message: format!("Queue name '{}' is invalid.", name),
                request_id: None,
                status_code: 400,
            });
        }

        let url = format!("memory://{}/{}", self.account, name);
        let mut storage = self.storage.write().map_err(|_| lock_poisoned())?;
        if !storage.queues.iter().any(|q| q.url == url) {
            storage.queues.push(InMemoryQueue {
                url: url.clone(),
                visibility_timeout_seconds,
                delay_seconds,
                messages: Vec::new(),
            });
        }

        Ok(Some(url))
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<String, SqsError> {
        let mut storage = self.storage.write().map_err(|_| lock_poisoned())?;
        let queue = storage.queue_mut(&request.queue_url)?;

        if let Some((code, message)) = entry_rejection(&request.body, request.delay_seconds) {
            return Err(SqsError::Service {
                error_type: "Sender".to_string(),
                code: code.to_string(),
                message,
                request_id: None,
                status_code: 400,
            });
        }

        let message_id = uuid::Uuid::new_v4().to_string();
        queue.messages.push(StoredMessage {
            message_id: message_id.clone(),
            body: request.body.clone(),
            delay_seconds: request.delay_seconds,
            attributes: request.attributes.clone(),
        });

        Ok(message_id)
    }

    async fn send_message_batch(
        &self,
        queue_url: &str,
        entries: &[BatchRequestEntry],
    ) -> Result<BatchResponse, SqsError> {
        let mut storage = self.storage.write().map_err(|_| lock_poisoned())?;
        let queue = storage.queue_mut(queue_url)?;

        let mut response = BatchResponse::default();
        for entry in entries {
            if let Some((code, message)) = entry_rejection(&entry.body, entry.delay_seconds) {
                response.failures.push(BatchResultErrorEntry {
                    id: entry.id.clone(),
                    code: code.to_string(),
                    message,
                    sender_fault: "true".to_string(),
                });
                continue;
            }

            let message_id = uuid::Uuid::new_v4().to_string();
            queue.messages.push(StoredMessage {
                message_id: message_id.clone(),
                body: entry.body.clone(),
                delay_seconds: entry.delay_seconds,
                attributes: entry.attributes.clone(),
            });
            response.successes.push(BatchResultEntry {
                id: entry.id.clone(),
                message_id,
            });
        }

        Ok(response)
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Hands out transports over one shared in-memory account
#[derive(Debug, Default)]
pub struct InMemoryTransportFactory {
    transport: InMemoryTransport,
    opened: AtomicUsize,
}

impl InMemoryTransportFactory {
    pub fn new(transport: InMemoryTransport) -> Self {
        Self {
            transport,
            opened: AtomicUsize::new(0),
        }
    }

    /// The shared transport, for inspecting stored messages
    pub fn transport(&self) -> &InMemoryTransport {
        &self.transport
    }

    /// Number of transports opened so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl TransportFactory for InMemoryTransportFactory {
    fn open(&self, _credentials: &Credentials) -> Result<Box<dyn QueueTransport>, SqsError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.transport.clone()))
    }
}

//! Transport client: queue listing and creation, single and batched sends.
//!
//! [`SqsClient`] owns one transport connection. It applies the batching
//! protocol on top of the raw [`QueueTransport`] contract and writes outcomes
//! back onto the caller's [`Message`] values. Failures propagate to the caller;
//! see [`crate::service::SqsService`] for the recording facade.

use crate::batch::{assign_batch_ids, validate_batch, BatchOutcome, BatchReport};
use crate::config::SqsConfig;
use crate::credentials::Credentials;
use crate::error::SqsError;
use crate::message::{BatchId, Message};
use crate::providers::aws::AwsSqsTransport;
use crate::queue::Queue;
use crate::transport::{BatchRequestEntry, QueueTransport, SendMessageRequest, WireAttribute};
use std::fmt;
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Visibility timeout applied when a queue is created without one
pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: u32 = 30;

/// Delivery delay applied when a queue is created without one
pub const DEFAULT_DELAY_SECONDS: u32 = 0;

/// Client for a single connection to the queue service
pub struct SqsClient {
    transport: Box<dyn QueueTransport>,
}

impl SqsClient {
    /// Wrap an already opened transport
    pub fn new(transport: Box<dyn QueueTransport>) -> Self {
        Self { transport }
    }

    /// Open an HTTP connection to SQS with the given credentials
    pub fn connect(credentials: &Credentials, config: &SqsConfig) -> Result<Self, SqsError> {
        let transport = AwsSqsTransport::new(credentials, config)?;
        Ok(Self::new(Box::new(transport)))
    }

    /// List every queue, deriving each name from its URL
    pub async fn list_queues(&self) -> Result<Vec<Queue>, SqsError> {
        let urls = self.transport.list_queues().await?;
        debug!(count = urls.len(), "Listed queues");

        Ok(urls.into_iter().map(Queue::from_url).collect())
    }

    /// Create a queue with the default visibility timeout and delay
    pub async fn create_queue(&self, name: &str) -> Result<Option<Queue>, SqsError> {
        self.create_queue_with_options(
            name,
            DEFAULT_VISIBILITY_TIMEOUT_SECONDS,
            DEFAULT_DELAY_SECONDS,
        )
        .await
    }

    /// Create a queue.
    ///
    /// Returns `None` when the service response carries no queue URL.
    pub async fn create_queue_with_options(
        &self,
        name: &str,
        visibility_timeout_seconds: u32,
        delay_seconds: u32,
    ) -> Result<Option<Queue>, SqsError> {
        let url = self
            .transport
            .create_queue(name, visibility_timeout_seconds, delay_seconds)
            .await?;

        match url {
            Some(url) if !url.is_empty() => {
                info!(queue = %name, queue_url = %url, "Created queue");
                Ok(Some(Queue::new(name, url)))
            }
            _ => {
                warn!(queue = %name, "Create queue response carried no queue URL");
                Ok(None)
            }
        }
    }

    /// Send one message, storing the assigned message id on it
    pub async fn send_message(&self, message: &mut Message) -> Result<(), SqsError> {
        let request = SendMessageRequest {
            queue_url: message.queue.url.clone(),
            body: message.body.clone(),
            delay_seconds: message.delay_seconds,
            attributes: wire_attributes(message),
        };

        let message_id = self.transport.send_message(&request).await?;
        debug!(queue_url = %request.queue_url, message_id = %message_id, "Sent message");

        message.error = None;
        message.aws_assigned_id = Some(message_id);
        Ok(())
    }

    /// Send up to ten messages for one queue in a single request.
    ///
    /// Preconditions are checked before anything is touched: an empty slice is
    /// a no-op, every message must target the first message's queue URL, and
    /// at most ten messages are allowed. Messages without a batch id are then
    /// numbered `"0"`, `"1"`, ... in order. Each message ends up with exactly
    /// one of `aws_assigned_id` / `error` set, or neither when the response did
    /// not mention it; the returned report says which.
    pub async fn send_message_batch(
        &self,
        messages: &mut [Message],
    ) -> Result<BatchReport, SqsError> {
        if messages.is_empty() {
            return Ok(BatchReport::default());
        }

        validate_batch(messages)?;
        assign_batch_ids(messages);

        let queue_url = messages[0].queue.url.clone();
        let mut submitted: Vec<BatchId> = Vec::with_capacity(messages.len());
        let mut entries: Vec<BatchRequestEntry> = Vec::with_capacity(messages.len());
        for message in messages.iter() {
            let Some(batch_id) = message.batch_id.clone() else {
                continue;
            };
            entries.push(BatchRequestEntry {
                id: batch_id.to_string(),
                body: message.body.clone(),
                delay_seconds: message.delay_seconds,
                attributes: wire_attributes(message),
            });
            submitted.push(batch_id);
        }

        debug!(queue_url = %queue_url, count = entries.len(), "Sending message batch");
        let response = self
            .transport
            .send_message_batch(&queue_url, &entries)
            .await?;

        let report = BatchReport::correlate(&submitted, response);
        report.apply_to(messages);

        for (batch_id, _) in report
            .entries()
            .iter()
            .filter(|(_, o)| matches!(o, BatchOutcome::NotReported))
        {
            warn!(
                queue_url = %queue_url,
                batch_id = %batch_id,
                "Batch response did not report an outcome for message"
            );
        }

        info!(
            queue_url = %queue_url,
            sent = report.sent_count(),
            failed = report.failed_count(),
            not_reported = report.not_reported_count(),
            "Sent message batch"
        );

        Ok(report)
    }
}

impl fmt::Debug for SqsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqsClient").finish_non_exhaustive()
    }
}

fn wire_attributes(message: &Message) -> Vec<WireAttribute> {
    message
        .attributes
        .iter()
        .map(|a| WireAttribute {
            name: a.name.clone(),
            value: a.value.clone(),
        })
        .collect()
}

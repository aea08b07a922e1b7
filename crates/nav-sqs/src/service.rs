//! Service facade over the transport client.
//!
//! [`SqsService`] opens a fresh [`SqsClient`] for every operation and drops it
//! when the operation ends, whatever the outcome. Failures are returned as
//! `Err` and also recorded as a diagnostic string that stays available through
//! [`SqsService::error_message`] until the next failure or an explicit
//! [`SqsService::clear_error`]. Successful calls leave the recorded message
//! untouched.

use crate::batch::BatchReport;
use crate::client::SqsClient;
use crate::config::SqsConfig;
use crate::credentials::Credentials;
use crate::error::SqsError;
use crate::message::Message;
use crate::providers::aws::HttpTransportFactory;
use crate::queue::Queue;
use crate::transport::TransportFactory;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

/// Queue service facade holding credentials and the last recorded failure
pub struct SqsService {
    credentials: Credentials,
    factory: Arc<dyn TransportFactory>,
    error_message: Option<String>,
}

impl SqsService {
    /// Create a facade talking to SQS over HTTP.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn new(credentials: Credentials, config: SqsConfig) -> Result<Self, SqsError> {
        config.validate()?;
        Ok(Self::with_factory(
            credentials,
            Arc::new(HttpTransportFactory::new(config)),
        ))
    }

    /// Create a facade over any transport factory
    pub fn with_factory(credentials: Credentials, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            credentials,
            factory,
            error_message: None,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Diagnostic text of the most recent recorded failure
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// True if a failure has been recorded and not cleared
    pub fn error_exists(&self) -> bool {
        self.error_message
            .as_deref()
            .is_some_and(|message| !message.is_empty())
    }

    /// Forget the recorded failure
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// List all queues
    pub async fn queues(&mut self) -> Result<Vec<Queue>, SqsError> {
        let result = match self.open_client() {
            Ok(client) => client.list_queues().await,
            Err(e) => Err(e),
        };
        self.record("list_queues", result)
    }

    /// Whether a queue with this name exists, ignoring case.
    ///
    /// Fetches the full listing on every call.
    pub async fn queue_exists(&mut self, name: &str) -> Result<bool, SqsError> {
        let queues = self.queues().await?;
        Ok(queues.iter().any(|q| q.name.eq_ignore_ascii_case(name)))
    }

    /// Whether a queue with this queue's URL exists, ignoring case
    pub async fn queue_exists_by_url(&mut self, queue: &Queue) -> Result<bool, SqsError> {
        let queues = self.queues().await?;
        Ok(queues.iter().any(|q| q.same_url(&queue.url)))
    }

    /// Create a queue with default visibility timeout and delay
    pub async fn create_queue(&mut self, name: &str) -> Result<Option<Queue>, SqsError> {
        let result = match self.open_client() {
            Ok(client) => client.create_queue(name).await,
            Err(e) => Err(e),
        };
        self.record("create_queue", result)
    }

    /// Create a queue with the given visibility timeout and default delay
    pub async fn create_queue_with_visibility(
        &mut self,
        name: &str,
        visibility_timeout_seconds: u32,
    ) -> Result<Option<Queue>, SqsError> {
        self.create_queue_with_options(
            name,
            visibility_timeout_seconds,
            crate::client::DEFAULT_DELAY_SECONDS,
        )
        .await
    }

    pub async fn create_queue_with_options(
        &mut self,
        name: &str,
        visibility_timeout_seconds: u32,
        delay_seconds: u32,
    ) -> Result<Option<Queue>, SqsError> {
        let result = match self.open_client() {
            Ok(client) => {
                client
                    .create_queue_with_options(name, visibility_timeout_seconds, delay_seconds)
                    .await
            }
            Err(e) => Err(e),
        };
        self.record("create_queue", result)
    }

    /// Send one message; see [`SqsClient::send_message`]
    pub async fn send_message(&mut self, message: &mut Message) -> Result<(), SqsError> {
        let result = match self.open_client() {
            Ok(client) => client.send_message(message).await,
            Err(e) => Err(e),
        };
        self.record("send_message", result)
    }

    /// Send a batch of messages; see [`SqsClient::send_message_batch`]
    pub async fn send_message_batch(
        &mut self,
        messages: &mut [Message],
    ) -> Result<BatchReport, SqsError> {
        let result = match self.open_client() {
            Ok(client) => client.send_message_batch(messages).await,
            Err(e) => Err(e),
        };
        self.record("send_message_batch", result)
    }

    fn open_client(&self) -> Result<SqsClient, SqsError> {
        let transport = self.factory.open(&self.credentials)?;
        Ok(SqsClient::new(transport))
    }

    fn record<T>(&mut self, operation: &str, result: Result<T, SqsError>) -> Result<T, SqsError> {
        if let Err(error) = &result {
            warn!(operation = %operation, error = %error, "Queue operation failed");
            self.error_message = Some(error.diagnostic());
        }
        result
    }
}

impl fmt::Debug for SqsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqsService")
            .field("credentials", &self.credentials)
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

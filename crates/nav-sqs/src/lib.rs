//! # nav-sqs
//!
//! Bindings for Amazon SQS built around a batch send that reports a result
//! for every message it submits.
//!
//! This library provides:
//! - Queue listing, creation and existence checks
//! - Single and batched message sends with string attributes
//! - Batch preconditions, correlation id assignment and per-message outcomes
//! - A facade that records the last failure for later inspection
//! - An HTTP transport signed with AWS Signature V4, and an in-memory one
//!
//! ## Module Organization
//!
//! - [`queue`], [`message`] - Queue identity and messages
//! - [`batch`] - Batch rules and the [`BatchReport`]
//! - [`client`] - [`SqsClient`], one transport connection
//! - [`service`] - [`SqsService`], the per-call facade
//! - [`transport`], [`providers`] - The transport contract and implementations
//! - [`config`], [`credentials`], [`error`] - Supporting types
//!
//! ## Example
//!
//! ```no_run
//! use nav_sqs::{Credentials, Message, SqsConfig, SqsService};
//!
//! # async fn example() -> Result<(), nav_sqs::SqsError> {
//! let mut service = SqsService::new(Credentials::from_env()?, SqsConfig::load(None)?)?;
//!
//! if let Some(queue) = service.create_queue("orders").await? {
//!     let mut messages = vec![
//!         Message::new(&queue, "first"),
//!         Message::new(&queue, "second").with_attribute("tenant", "acme"),
//!     ];
//!     let report = service.send_message_batch(&mut messages).await?;
//!     println!("{} of {} sent", report.sent_count(), report.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod message;
pub mod providers;
pub mod queue;
pub mod service;
pub mod transport;

pub use batch::{BatchOutcome, BatchReport, MAX_BATCH_SIZE};
pub use client::{SqsClient, DEFAULT_DELAY_SECONDS, DEFAULT_VISIBILITY_TIMEOUT_SECONDS};
pub use config::SqsConfig;
pub use credentials::{Credentials, SecretKey};
pub use error::{
    BatchErrorRecord, BatchViolation, ConfigurationError, ErrorRecord, SqsError, ValidationError,
};
pub use message::{Attribute, BatchId, Message, MessageOutcome};
pub use queue::{name_from_url, Queue};
pub use service::SqsService;
pub use transport::{
    BatchRequestEntry, BatchResponse, BatchResultEntry, BatchResultErrorEntry, QueueTransport,
    SendMessageRequest, TransportFactory, WireAttribute,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

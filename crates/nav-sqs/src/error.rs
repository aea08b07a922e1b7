//! Error types for queue operations.
//!
//! Two families live here:
//! - [`SqsError`]: call-scoped failures returned through `Result`.
//! - [`ErrorRecord`] / [`BatchErrorRecord`]: message-scoped failure data that a
//!   successful batch response attaches to individual messages.

use crate::message::BatchId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub(crate) const UNKNOWN: &str = "<unknown>";

/// Service label recorded on per-message batch failures
pub const BATCH_SEND_SERVICE: &str = "SQS Send Message Batch";

/// Comprehensive error type for all queue operations
#[derive(Debug, Error)]
pub enum SqsError {
    #[error("SQS service error ({status_code}): {code} - {message}")]
    Service {
        error_type: String,
        code: String,
        message: String,
        request_id: Option<String>,
        status_code: u16,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    #[error("Error when sending messages to queue '{queue_url}': {violation}")]
    BatchConstraintViolation {
        queue_url: String,
        violation: BatchViolation,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl SqsError {
    /// True when the failure came from talking to the remote service
    pub fn is_transport_failure(&self) -> bool {
        match self {
            Self::Service { .. } => true,
            Self::Authentication(_) => true,
            Self::Network(_) => true,
            Self::InvalidResponse(_) => true,
            Self::BatchConstraintViolation { .. } => false,
            Self::Configuration(_) => false,
            Self::Validation(_) => false,
        }
    }

    /// Render the multi-line diagnostic recorded by the service facade.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Service {
                error_type,
                code,
                request_id,
                status_code,
                ..
            } => format!(
                "AWS Simple Queue Service Exception\n\nError Type: {}\nError Code: {}\nRequest Id: {}\nStatus Code: {}\n\n{}",
                error_type,
                code,
                request_id.as_deref().unwrap_or(UNKNOWN),
                status_code,
                self
            ),
            _ => self.to_string(),
        }
    }
}

/// Which batching precondition a batch send broke
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchViolation {
    #[error("All messages sent in a batch must reference the same URL (found '{found}', expected '{expected}').")]
    MixedQueueUrls { expected: String, found: String },

    #[error("No more than {max} messages can be sent in a single batch ({count} given).")]
    TooManyMessages { count: usize, max: usize },

    #[error("Batch id '{batch_id}' is used by more than one message.")]
    DuplicateBatchId { batch_id: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {message}")]
    Parsing { message: String },
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },
}

// ============================================================================
// Message-scoped error records
// ============================================================================

/// A structured service error attached to a message rather than a call.
///
/// Every field defaults to `"<unknown>"` so a partially reported failure still
/// renders something readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Name of the service that produced the error
    pub service: String,
    /// Service error code
    pub code: String,
    /// Human readable error text
    pub message_text: String,
    /// Whether the sender was at fault, as reported by the service
    pub sender_fault: String,
}

impl Default for ErrorRecord {
    fn default() -> Self {
        Self {
            service: UNKNOWN.to_string(),
            code: UNKNOWN.to_string(),
            message_text: UNKNOWN.to_string(),
            sender_fault: UNKNOWN.to_string(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error Code: {} on Service {}\n\nMessage: {}\n\nSenderFault: {}",
            self.code, self.service, self.message_text, self.sender_fault
        )
    }
}

/// A per-entry failure from a batch send, correlated by batch id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchErrorRecord {
    pub batch_id: BatchId,
    #[serde(flatten)]
    pub record: ErrorRecord,
}

impl BatchErrorRecord {
    /// Build the record for a failed batch entry
    pub fn from_batch_failure(
        batch_id: BatchId,
        code: impl Into<String>,
        message_text: impl Into<String>,
        sender_fault: impl Into<String>,
    ) -> Self {
        Self {
            batch_id,
            record: ErrorRecord {
                service: BATCH_SEND_SERVICE.to_string(),
                code: code.into(),
                message_text: message_text.into(),
                sender_fault: sender_fault.into(),
            },
        }
    }
}

impl fmt::Display for BatchErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error Code: {} on Service {}\nBatchId: {}\n\nMessage: {}\n\nSenderFault: {}",
            self.record.code,
            self.record.service,
            self.batch_id,
            self.record.message_text,
            self.record.sender_fault
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

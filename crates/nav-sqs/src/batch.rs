//! Batch send rules: preconditions, correlation id assignment and mapping a
//! batch response back onto the submitted messages.

use crate::error::{BatchErrorRecord, BatchViolation, SqsError};
use crate::message::{BatchId, Message};
use crate::transport::BatchResponse;
use std::collections::{HashMap, HashSet};
use tracing::warn;

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;

/// Maximum number of messages accepted by one batch send
pub const MAX_BATCH_SIZE: usize = 10;

/// Check the batching preconditions without touching any message.
///
/// All messages must target the first message's queue URL (compared
/// case-insensitively), there may be at most [`MAX_BATCH_SIZE`] of them, and
/// preset batch ids must be distinct.
pub fn validate_batch(messages: &[Message]) -> Result<(), SqsError> {
    let Some(first) = messages.first() else {
        return Ok(());
    };
    let queue_url = &first.queue.url;

    let reject = |violation: BatchViolation| SqsError::BatchConstraintViolation {
        queue_url: queue_url.clone(),
        violation,
    };

    if let Some(other) = messages.iter().find(|m| !m.queue.same_url(queue_url)) {
        return Err(reject(BatchViolation::MixedQueueUrls {
            expected: queue_url.clone(),
            found: other.queue.url.clone(),
        }));
    }

    if messages.len() > MAX_BATCH_SIZE {
        return Err(reject(BatchViolation::TooManyMessages {
            count: messages.len(),
            max: MAX_BATCH_SIZE,
        }));
    }

    let mut seen = HashSet::new();
    for id in messages.iter().filter_map(|m| m.batch_id.as_ref()) {
        if !seen.insert(id.as_str()) {
            return Err(reject(BatchViolation::DuplicateBatchId {
                batch_id: id.to_string(),
            }));
        }
    }

    Ok(())
}

/// Give every message without a batch id the next unused sequential id.
///
/// Numbering starts at `"0"` and is scoped to this call. Preset ids are kept
/// and their numeric values are skipped so ids stay distinct.
pub fn assign_batch_ids(messages: &mut [Message]) {
    let preset: HashSet<String> = messages
        .iter()
        .filter_map(|m| m.batch_id.as_ref().map(|id| id.as_str().to_string()))
        .collect();

    let mut next = 0usize;
    for message in messages.iter_mut().filter(|m| m.batch_id.is_none()) {
        while preset.contains(&next.to_string()) {
            next += 1;
        }
        message.batch_id = Some(BatchId::sequential(next));
        next += 1;
    }
}

/// What the service reported for one submitted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Sent { message_id: String },
    Failed(BatchErrorRecord),
    /// The response mentioned neither a success nor a failure for this id
    NotReported,
}

/// Outcome of every message of one batch send, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    entries: Vec<(BatchId, BatchOutcome)>,
}

impl BatchReport {
    /// Correlate a batch response with the submitted ids by exact id match.
    ///
    /// Response entries may arrive in any order. Entries naming an id that was
    /// not submitted are dropped, as are failure entries with a blank id. An
    /// id reported both as sent and as failed resolves to the failure.
    pub fn correlate(submitted: &[BatchId], response: BatchResponse) -> Self {
        let mut reported: HashMap<String, BatchOutcome> = HashMap::new();

        for success in response.successes {
            let previous = reported.insert(
                success.id.clone(),
                BatchOutcome::Sent {
                    message_id: success.message_id,
                },
            );
            if previous.is_some() {
                warn!(batch_id = %success.id, "Batch response reports the same id more than once");
            }
        }

        // A failure report for an id wins over any success reported for it.
        for failure in response.failures {
            let batch_id = match BatchId::new(failure.id.clone()) {
                Ok(batch_id) => batch_id,
                Err(_) => {
                    warn!(
                        code = %failure.code,
                        "Ignoring batch failure entry with a blank id"
                    );
                    continue;
                }
            };
            let outcome = BatchOutcome::Failed(BatchErrorRecord::from_batch_failure(
                batch_id,
                failure.code,
                failure.message,
                failure.sender_fault,
            ));
            match reported.insert(failure.id.clone(), outcome) {
                Some(BatchOutcome::Sent { message_id }) => warn!(
                    batch_id = %failure.id,
                    message_id = %message_id,
                    "Batch response reports the same id as sent and failed; keeping the failure"
                ),
                Some(_) => {
                    warn!(batch_id = %failure.id, "Batch response reports the same id more than once")
                }
                None => {}
            }
        }

        let entries: Vec<(BatchId, BatchOutcome)> = submitted
            .iter()
            .map(|id| {
                let outcome = reported
                    .remove(id.as_str())
                    .unwrap_or(BatchOutcome::NotReported);
                (id.clone(), outcome)
            })
            .collect();

        for id in reported.keys() {
            warn!(batch_id = %id, "Batch response entry matches no submitted message");
        }

        Self { entries }
    }

    /// Outcome for a single batch id
    pub fn outcome(&self, batch_id: &BatchId) -> Option<&BatchOutcome> {
        self.entries
            .iter()
            .find(|(id, _)| id == batch_id)
            .map(|(_, outcome)| outcome)
    }

    /// All outcomes in submission order
    pub fn entries(&self) -> &[(BatchId, BatchOutcome)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sent_count(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Sent { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Failed(_)))
    }

    pub fn not_reported_count(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::NotReported))
    }

    /// True when every message was reported as sent
    pub fn all_sent(&self) -> bool {
        self.sent_count() == self.entries.len()
    }

    /// Write the outcomes onto the messages carrying the matching batch ids.
    ///
    /// A sent message gets its assigned id and loses any old error, a failed
    /// one gets the error record and loses any old id, and an unreported one
    /// is left with neither.
    pub fn apply_to(&self, messages: &mut [Message]) {
        for message in messages.iter_mut() {
            let Some(outcome) = message.batch_id.as_ref().and_then(|id| self.outcome(id)) else {
                continue;
            };

            message.reset_outcome();
            match outcome {
                BatchOutcome::Sent { message_id } => {
                    message.aws_assigned_id = Some(message_id.clone());
                }
                BatchOutcome::Failed(error) => {
                    message.error = Some(error.clone());
                }
                BatchOutcome::NotReported => {}
            }
        }
    }

    fn count(&self, predicate: impl Fn(&BatchOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| predicate(o)).count()
    }
}

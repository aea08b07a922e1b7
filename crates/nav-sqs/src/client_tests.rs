//! Tests for the transport client and the batch send protocol.

use super::*;
use crate::error::{BatchErrorRecord, BatchViolation};
use crate::message::MessageOutcome;
use crate::transport::{BatchResponse, BatchResultEntry, BatchResultErrorEntry};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A transport call as seen by the scripted transport
#[derive(Debug, Clone, PartialEq)]
enum Call {
    List,
    Create {
        name: String,
        visibility_timeout_seconds: u32,
        delay_seconds: u32,
    },
    Send(SendMessageRequest),
    Batch {
        queue_url: String,
        entries: Vec<BatchRequestEntry>,
    },
}

/// Transport that records calls and answers with canned responses
#[derive(Default)]
struct ScriptedTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    queue_urls: Vec<String>,
    created_url: Option<String>,
    batch_response: BatchResponse,
    fail_with: Option<fn() -> SqsError>,
}

impl ScriptedTransport {
    fn record(&self, call: Call) -> Result<(), SqsError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with {
            Some(make_error) => Err(make_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QueueTransport for ScriptedTransport {
    async fn list_queues(&self) -> Result<Vec<String>, SqsError> {
        self.record(Call::List)?;
        Ok(self.queue_urls.clone())
    }

    async fn create_queue(
        &self,
        name: &str,
        visibility_timeout_seconds: u32,
        delay_seconds: u32,
    ) -> Result<Option<String>, SqsError> {
        self.record(Call::Create {
            name: name.to_string(),
            visibility_timeout_seconds,
            delay_seconds,
        })?;
        Ok(self.created_url.clone())
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<String, SqsError> {
        self.record(Call::Send(request.clone()))?;
        Ok("msg-single".to_string())
    }

    async fn send_message_batch(
        &self,
        queue_url: &str,
        entries: &[BatchRequestEntry],
    ) -> Result<BatchResponse, SqsError> {
        self.record(Call::Batch {
            queue_url: queue_url.to_string(),
            entries: entries.to_vec(),
        })?;
        Ok(self.batch_response.clone())
    }
}

fn client_with(transport: ScriptedTransport) -> (SqsClient, Arc<Mutex<Vec<Call>>>) {
    let calls = transport.calls.clone();
    (SqsClient::new(Box::new(transport)), calls)
}

fn orders() -> Queue {
    Queue::new("orders", "https://svc/acct/orders")
}

fn success(id: &str, message_id: &str) -> BatchResultEntry {
    BatchResultEntry {
        id: id.to_string(),
        message_id: message_id.to_string(),
    }
}

fn failure(id: &str, code: &str, message: &str) -> BatchResultErrorEntry {
    BatchResultErrorEntry {
        id: id.to_string(),
        code: code.to_string(),
        message: message.to_string(),
        sender_fault: "true".to_string(),
    }
}

mod queue_operations {
    use super::*;

    #[tokio::test]
    async fn test_list_queues_derives_names_in_server_order() {
        let (client, _) = client_with(ScriptedTransport {
            queue_urls: vec![
                "https://svc/acct/Queue01".to_string(),
                "https://svc/acct/Queue02/".to_string(),
            ],
            ..Default::default()
        });

        let queues = client.list_queues().await.unwrap();

        assert_eq!(
            queues,
            vec![
                Queue::new("Queue01", "https://svc/acct/Queue01"),
                Queue::new("Queue02", "https://svc/acct/Queue02/"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_queues_empty() {
        let (client, _) = client_with(ScriptedTransport::default());

        assert!(client.list_queues().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_queue_forwards_defaults() {
        let (client, calls) = client_with(ScriptedTransport {
            created_url: Some("https://svc/acct/orders".to_string()),
            ..Default::default()
        });

        let queue = client.create_queue("orders").await.unwrap();

        assert_eq!(queue, Some(orders()));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Call::Create {
                name: "orders".to_string(),
                visibility_timeout_seconds: 30,
                delay_seconds: 0,
            }]
        );
    }

    #[tokio::test]
    async fn test_create_queue_keeps_requested_name() {
        let (client, _) = client_with(ScriptedTransport {
            created_url: Some("https://svc/acct/renamed".to_string()),
            ..Default::default()
        });

        let queue = client
            .create_queue_with_options("orders", 60, 5)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(queue.name, "orders");
        assert_eq!(queue.url, "https://svc/acct/renamed");
    }

    #[tokio::test]
    async fn test_create_queue_without_url_returns_none() {
        for created_url in [None, Some(String::new())] {
            let (client, _) = client_with(ScriptedTransport {
                created_url,
                ..Default::default()
            });

            assert_eq!(client.create_queue("orders").await.unwrap(), None);
        }
    }
}

mod single_send {
    use super::*;

    #[tokio::test]
    async fn test_send_message_sets_assigned_id() {
        let (client, calls) = client_with(ScriptedTransport::default());
        let mut message = Message::new(&orders(), "hello")
            .with_delay_seconds(7)
            .with_attribute("tenant", "acme");

        client.send_message(&mut message).await.unwrap();

        assert_eq!(message.outcome(), MessageOutcome::Sent("msg-single"));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Call::Send(SendMessageRequest {
                queue_url: "https://svc/acct/orders".to_string(),
                body: "hello".to_string(),
                delay_seconds: 7,
                attributes: vec![WireAttribute {
                    name: "tenant".to_string(),
                    value: "acme".to_string(),
                }],
            })]
        );
    }

    #[tokio::test]
    async fn test_send_message_failure_propagates() {
        let (client, _) = client_with(ScriptedTransport {
            fail_with: Some(|| SqsError::Network("Connection reset".to_string())),
            ..Default::default()
        });
        let mut message = Message::new(&orders(), "hello");

        let result = client.send_message(&mut message).await;

        assert!(matches!(result, Err(SqsError::Network(_))));
        assert!(message.aws_assigned_id.is_none());
    }
}

mod batch_send {
    use super::*;

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let (client, calls) = client_with(ScriptedTransport::default());

        let report = client.send_message_batch(&mut []).await.unwrap();

        assert!(report.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_outcomes_are_applied_to_messages() {
        let (client, calls) = client_with(ScriptedTransport {
            batch_response: BatchResponse {
                successes: vec![success("1", "m-1"), success("0", "m-0")],
                failures: vec![failure("2", "X", "bad")],
            },
            ..Default::default()
        });
        let queue = orders();
        let mut messages = vec![
            Message::new(&queue, "a"),
            Message::new(&queue, "b").with_delay_seconds(4),
            Message::new(&queue, "c"),
        ];

        let report = client.send_message_batch(&mut messages).await.unwrap();

        assert_eq!(report.sent_count(), 2);
        assert_eq!(messages[0].aws_assigned_id.as_deref(), Some("m-0"));
        assert_eq!(messages[1].aws_assigned_id.as_deref(), Some("m-1"));
        assert_eq!(
            messages[2].error,
            Some(BatchErrorRecord::from_batch_failure(
                BatchId::new("2").unwrap(),
                "X",
                "bad",
                "true"
            ))
        );
        assert_eq!(
            messages[2].error.as_ref().unwrap().record.service,
            "SQS Send Message Batch"
        );

        let calls = calls.lock().unwrap();
        match &calls[..] {
            [Call::Batch { queue_url, entries }] => {
                assert_eq!(queue_url, "https://svc/acct/orders");
                let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
                assert_eq!(ids, vec!["0", "1", "2"]);
                assert_eq!(entries[1].body, "b");
                assert_eq!(entries[1].delay_seconds, 4);
            }
            other => panic!("Expected one batch call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_preset_batch_ids_are_submitted_unchanged() {
        let (client, calls) = client_with(ScriptedTransport {
            batch_response: BatchResponse {
                successes: vec![success("first", "m-first"), success("0", "m-0")],
                failures: vec![],
            },
            ..Default::default()
        });
        let queue = orders();
        let mut messages = vec![
            Message::new(&queue, "a").with_batch_id(BatchId::new("first").unwrap()),
            Message::new(&queue, "b"),
        ];

        client.send_message_batch(&mut messages).await.unwrap();

        assert_eq!(messages[0].batch_id.as_ref().unwrap().as_str(), "first");
        assert_eq!(messages[1].batch_id.as_ref().unwrap().as_str(), "0");
        assert_eq!(messages[0].aws_assigned_id.as_deref(), Some("m-first"));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mixed_queue_urls_fail_before_sending() {
        let (client, calls) = client_with(ScriptedTransport::default());
        let mut messages = vec![
            Message::new(&orders(), "a"),
            Message::new(&Queue::new("billing", "https://svc/acct/billing"), "b"),
        ];

        let result = client.send_message_batch(&mut messages).await;

        assert!(matches!(
            result,
            Err(SqsError::BatchConstraintViolation {
                violation: BatchViolation::MixedQueueUrls { .. },
                ..
            })
        ));
        assert!(calls.lock().unwrap().is_empty());
        for message in &messages {
            assert!(message.aws_assigned_id.is_none());
            assert!(message.error.is_none());
            assert!(message.batch_id.is_none());
        }
    }

    #[tokio::test]
    async fn test_eleven_messages_fail_before_sending() {
        let (client, calls) = client_with(ScriptedTransport::default());
        let queue = orders();
        let mut messages: Vec<Message> = (0..11).map(|i| Message::new(&queue, i.to_string())).collect();

        let result = client.send_message_batch(&mut messages).await;

        assert!(matches!(
            result,
            Err(SqsError::BatchConstraintViolation {
                violation: BatchViolation::TooManyMessages { count: 11, max: 10 },
                ..
            })
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreported_messages_have_unknown_outcome() {
        let (client, _) = client_with(ScriptedTransport {
            batch_response: BatchResponse {
                successes: vec![success("0", "m-0"), success("99", "m-99")],
                failures: vec![],
            },
            ..Default::default()
        });
        let queue = orders();
        let mut messages = vec![Message::new(&queue, "a"), Message::new(&queue, "b")];
        messages[1].aws_assigned_id = Some("from-an-earlier-send".to_string());

        let report = client.send_message_batch(&mut messages).await.unwrap();

        assert_eq!(report.not_reported_count(), 1);
        assert_eq!(
            report.outcome(&BatchId::new("1").unwrap()),
            Some(&BatchOutcome::NotReported)
        );
        assert_eq!(messages[1].outcome(), MessageOutcome::Unknown);
    }

    #[tokio::test]
    async fn test_batch_transport_failure_propagates() {
        let (client, _) = client_with(ScriptedTransport {
            fail_with: Some(|| SqsError::Authentication("SignatureDoesNotMatch".to_string())),
            ..Default::default()
        });
        let queue = orders();
        let mut messages = vec![Message::new(&queue, "a")];

        let result = client.send_message_batch(&mut messages).await;

        assert!(matches!(result, Err(SqsError::Authentication(_))));
        assert!(messages[0].aws_assigned_id.is_none());
        assert!(messages[0].error.is_none());
    }
}

#[test]
fn test_debug_does_not_expose_transport() {
    let (client, _) = client_with(ScriptedTransport::default());

    assert_eq!(format!("{:?}", client), "SqsClient { .. }");
}

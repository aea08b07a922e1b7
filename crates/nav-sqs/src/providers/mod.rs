//! Queue transport implementations.
//!
//! This module contains concrete implementations of the `QueueTransport` and
//! `TransportFactory` traits: the HTTP transport talking to SQS and an
//! in-memory one for tests and local development.

pub mod aws;
pub mod memory;

pub use aws::{AwsSqsTransport, HttpTransportFactory};
pub use memory::{InMemoryTransport, InMemoryTransportFactory, StoredMessage};

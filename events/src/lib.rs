//! Queue message infrastructure for the notification hub.
//!
//! This crate provides the contracts that decouple the HTTP-facing request
//! paths from the delivery work performed by the queue consumers.
//!
//! # Architecture
//!
//! - **QueueMessage**: Enum representing every work item that travels over a queue
//! - **QueuePublisher**: Producer side of the queue transport
//! - **InMemoryBroker**: Process-local transport adapter with one FIFO per named queue
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Payloads are carried as JSON documents.

pub mod broker;
pub mod error;
pub mod message;

pub use broker::{InMemoryBroker, QueueConsumer, QueuePublisher};
pub use message::{
    NotifySubscriberMessage, QueueMessage, QueueName, SubscriberRef, TopicSubscriptionMessage,
};

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = uuid::Uuid;

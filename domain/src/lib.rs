//! The notification engine and the use cases around it.
//!
//! Entity models are re-exported from `entity_api` so that consumers of the
//! `domain` crate never need to depend on the persistence crates directly.

pub use entity_api::delivery::DeliveryFilter;
pub use entity_api::{
    notifications, subscriber_notifications, subscriber_topics, subscribers, topics, Id,
};

pub mod dispatcher;
pub mod error;
pub mod intake;
pub mod notification;
pub mod reconciler;
pub mod store;
pub mod topic;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use intake::QueueIntake;
pub use reconciler::{Reconciler, SubscriptionIntent, SubscriptionOutcome};
pub use store::{NotificationStore, Stores, SubscriptionStore};

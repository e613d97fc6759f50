//! Storage seams for the notification engine.
//!
//! The reconciler, the dispatcher and the CRUD use cases only talk to the two
//! traits below. `postgres` implements them over `entity_api`, `memory` keeps
//! everything in process; the backend is picked once at startup.

use crate::error::Error;
use crate::{notifications, subscriber_notifications, subscriber_topics, subscribers, topics, Id};
use async_trait::async_trait;
use entity_api::delivery::DeliveryFilter;
use sse::{SubscriberDirectory, SubscriberId};
use std::sync::Arc;

pub mod memory;
pub mod postgres;

/// Durable subscriber ↔ topic mapping plus the lookups around it.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_topic_by_domain(&self, domain: &str) -> Result<Option<topics::Model>, Error>;

    async fn find_topic_by_id(&self, topic_id: Id) -> Result<Option<topics::Model>, Error>;

    /// Fails with a duplicate entity error when the domain is taken.
    async fn create_topic(
        &self,
        domain: String,
        description: Option<String>,
    ) -> Result<topics::Model, Error>;

    async fn find_subscriptions_by_topic(
        &self,
        topic_id: Id,
    ) -> Result<Vec<subscriber_topics::Model>, Error>;

    async fn find_subscriptions_by_subscriber(
        &self,
        subscriber_id: Id,
    ) -> Result<Vec<subscriber_topics::Model>, Error>;

    /// Fails with a duplicate entity error when the pair already exists.
    async fn create_subscription(
        &self,
        subscriber_id: Id,
        topic_id: Id,
    ) -> Result<subscriber_topics::Model, Error>;

    /// Returns whether a row was removed.
    async fn delete_subscription(&self, subscriber_id: Id, topic_id: Id) -> Result<bool, Error>;

    async fn find_subscriber(&self, subscriber_id: Id)
        -> Result<Option<subscribers::Model>, Error>;
}

/// Notifications and their per-subscriber delivery records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(
        &self,
        topic_id: Id,
        subject: String,
    ) -> Result<notifications::Model, Error>;

    async fn find_notification_by_id(
        &self,
        notification_id: Id,
    ) -> Result<Option<notifications::Model>, Error>;

    async fn create_delivery_records(
        &self,
        notification_id: Id,
        subscriber_ids: &[Id],
    ) -> Result<(), Error>;

    /// Flags the records of `notification_id` held by `subscriber_ids` as sent.
    async fn mark_delivered(
        &self,
        notification_id: Id,
        subscriber_ids: &[Id],
    ) -> Result<u64, Error>;

    async fn mark_read(&self, notification_ids: &[Id]) -> Result<u64, Error>;

    async fn mark_deleted(&self, notification_ids: &[Id]) -> Result<u64, Error>;

    async fn find_delivery_records(
        &self,
        subscriber_id: Id,
        filter: DeliveryFilter,
    ) -> Result<Vec<subscriber_notifications::Model>, Error>;

    /// One 1-based page of notifications on `topic_ids`, newest first, and the total.
    async fn find_notifications_page(
        &self,
        topic_ids: Vec<Id>,
        only_ids: Option<Vec<Id>>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<notifications::Model>, u64), Error>;
}

/// The pair of store handles shared by every use case.
#[derive(Clone)]
pub struct Stores {
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    /// Builds both handles from a single adapter implementing the two traits.
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: SubscriptionStore + NotificationStore + 'static,
    {
        Self {
            subscriptions: store.clone(),
            notifications: store,
        }
    }

    /// The `findSubscriber` capability the SSE manager is guarded by.
    pub fn subscriber_directory(&self) -> Arc<dyn SubscriberDirectory> {
        Arc::new(StoreDirectory {
            subscriptions: Arc::clone(&self.subscriptions),
        })
    }
}

struct StoreDirectory {
    subscriptions: Arc<dyn SubscriptionStore>,
}

#[async_trait]
impl SubscriberDirectory for StoreDirectory {
    async fn subscriber_exists(&self, subscriber_id: SubscriberId) -> Result<bool, sse::error::Error> {
        self.subscriptions
            .find_subscriber(subscriber_id)
            .await
            .map(|subscriber| subscriber.is_some())
            .map_err(|e| sse::error::Error::lookup(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[tokio::test]
    async fn directory_reports_known_subscribers_only() -> Result<(), Error> {
        let store = Arc::new(MemoryStore::new());
        let alice = store
            .insert_subscriber("Alice", "alice@example.com")
            .await?;
        let directory = Stores::new(store).subscriber_directory();

        assert!(directory.subscriber_exists(alice.id).await.unwrap());
        assert!(!directory.subscriber_exists(Id::new_v4()).await.unwrap());

        Ok(())
    }
}

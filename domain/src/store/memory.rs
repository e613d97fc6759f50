//! In-memory store adapter.
//!
//! Implements both store traits over `HashMap`s guarded by one
//! `tokio::sync::RwLock`. Nothing survives a restart; this backend serves
//! local development and the engine tests. Uniqueness rules match the
//! Postgres schema: one topic per domain, one subscription per
//! (subscriber, topic) pair and one delivery record per
//! (subscriber, notification) pair.

use super::{NotificationStore, SubscriptionStore};
use crate::error::{EntityErrorKind, Error};
use crate::{notifications, subscriber_notifications, subscriber_topics, subscribers, topics, Id};
use async_trait::async_trait;
use chrono::Utc;
use entity_api::delivery::DeliveryFilter;
use log::*;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    topics: HashMap<Id, topics::Model>,
    subscribers: HashMap<Id, subscribers::Model>,
    /// Keyed by `(subscriber_id, topic_id)`.
    subscriptions: HashMap<(Id, Id), subscriber_topics::Model>,
    notifications: HashMap<Id, notifications::Model>,
    /// Insertion order of `notifications`, oldest first.
    notification_order: Vec<Id>,
    /// Keyed by `(subscriber_id, notification_id)`.
    deliveries: HashMap<(Id, Id), subscriber_notifications::Model>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribers are owned outside the engine; this is how they get in.
    pub async fn insert_subscriber(&self, name: &str, email: &str) -> Result<subscribers::Model, Error> {
        let mut state = self.state.write().await;
        if state.subscribers.values().any(|s| s.email == email) {
            return Err(Error::entity(EntityErrorKind::Duplicate));
        }

        let now = Utc::now();
        let subscriber = subscribers::Model {
            id: Id::new_v4(),
            name: name.to_owned(),
            email: email.to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        };
        state.subscribers.insert(subscriber.id, subscriber.clone());

        Ok(subscriber)
    }

    pub async fn delivery_record(
        &self,
        subscriber_id: Id,
        notification_id: Id,
    ) -> Option<subscriber_notifications::Model> {
        self.state
            .read()
            .await
            .deliveries
            .get(&(subscriber_id, notification_id))
            .cloned()
    }

    pub async fn subscription_count(&self, subscriber_id: Id, topic_id: Id) -> usize {
        self.state
            .read()
            .await
            .subscriptions
            .keys()
            .filter(|key| **key == (subscriber_id, topic_id))
            .count()
    }

    /// Loads the demo data set served by a fresh in-memory hub.
    pub async fn seed(&self) -> Result<(), Error> {
        let alice = self.insert_subscriber("Alice", "alice@example.com").await?;
        self.insert_subscriber("Bob", "bob@example.com").await?;
        self.insert_subscriber("Carol", "carol@example.com").await?;

        let orders = self
            .create_topic(
                "orders".to_owned(),
                Some("Order lifecycle updates".to_owned()),
            )
            .await?;
        self.create_topic("billing".to_owned(), None).await?;
        self.create_subscription(alice.id, orders.id).await?;

        info!("Seeded in-memory store with subscriber {}", alice.id);
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_topic_by_domain(&self, domain: &str) -> Result<Option<topics::Model>, Error> {
        let state = self.state.read().await;
        Ok(state.topics.values().find(|t| t.domain == domain).cloned())
    }

    async fn find_topic_by_id(&self, topic_id: Id) -> Result<Option<topics::Model>, Error> {
        Ok(self.state.read().await.topics.get(&topic_id).cloned())
    }

    async fn create_topic(
        &self,
        domain: String,
        description: Option<String>,
    ) -> Result<topics::Model, Error> {
        let mut state = self.state.write().await;
        if state.topics.values().any(|t| t.domain == domain) {
            return Err(Error::entity(EntityErrorKind::Duplicate));
        }

        let now = Utc::now();
        let topic = topics::Model {
            id: Id::new_v4(),
            domain,
            description,
            created_at: now.into(),
            updated_at: now.into(),
        };
        state.topics.insert(topic.id, topic.clone());

        Ok(topic)
    }

    async fn find_subscriptions_by_topic(
        &self,
        topic_id: Id,
    ) -> Result<Vec<subscriber_topics::Model>, Error> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .values()
            .filter(|s| s.topic_id == topic_id)
            .cloned()
            .collect())
    }

    async fn find_subscriptions_by_subscriber(
        &self,
        subscriber_id: Id,
    ) -> Result<Vec<subscriber_topics::Model>, Error> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .values()
            .filter(|s| s.subscriber_id == subscriber_id)
            .cloned()
            .collect())
    }

    async fn create_subscription(
        &self,
        subscriber_id: Id,
        topic_id: Id,
    ) -> Result<subscriber_topics::Model, Error> {
        let mut state = self.state.write().await;
        if !state.subscribers.contains_key(&subscriber_id) || !state.topics.contains_key(&topic_id)
        {
            return Err(Error::entity(EntityErrorKind::NotFound));
        }
        if state.subscriptions.contains_key(&(subscriber_id, topic_id)) {
            return Err(Error::entity(EntityErrorKind::Duplicate));
        }

        let now = Utc::now();
        let subscription = subscriber_topics::Model {
            id: Id::new_v4(),
            subscriber_id,
            topic_id,
            created_at: now.into(),
            updated_at: now.into(),
        };
        state
            .subscriptions
            .insert((subscriber_id, topic_id), subscription.clone());

        Ok(subscription)
    }

    async fn delete_subscription(&self, subscriber_id: Id, topic_id: Id) -> Result<bool, Error> {
        let mut state = self.state.write().await;
        Ok(state
            .subscriptions
            .remove(&(subscriber_id, topic_id))
            .is_some())
    }

    async fn find_subscriber(
        &self,
        subscriber_id: Id,
    ) -> Result<Option<subscribers::Model>, Error> {
        Ok(self.state.read().await.subscribers.get(&subscriber_id).cloned())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create_notification(
        &self,
        topic_id: Id,
        subject: String,
    ) -> Result<notifications::Model, Error> {
        let mut state = self.state.write().await;
        if !state.topics.contains_key(&topic_id) {
            return Err(Error::entity(EntityErrorKind::NotFound));
        }

        let now = Utc::now();
        let notification = notifications::Model {
            id: Id::new_v4(),
            topic_id,
            subject,
            created_at: now.into(),
            updated_at: now.into(),
        };
        state.notification_order.push(notification.id);
        state
            .notifications
            .insert(notification.id, notification.clone());

        Ok(notification)
    }

    async fn find_notification_by_id(
        &self,
        notification_id: Id,
    ) -> Result<Option<notifications::Model>, Error> {
        Ok(self
            .state
            .read()
            .await
            .notifications
            .get(&notification_id)
            .cloned())
    }

    async fn create_delivery_records(
        &self,
        notification_id: Id,
        subscriber_ids: &[Id],
    ) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if subscriber_ids
            .iter()
            .any(|id| state.deliveries.contains_key(&(*id, notification_id)))
        {
            return Err(Error::entity(EntityErrorKind::Duplicate));
        }

        let now = Utc::now();
        for subscriber_id in subscriber_ids {
            let record = subscriber_notifications::Model {
                id: Id::new_v4(),
                subscriber_id: *subscriber_id,
                notification_id,
                is_sent: false,
                sent_at: None,
                is_read: false,
                read_at: None,
                is_deleted: false,
                deleted_at: None,
                created_at: now.into(),
                updated_at: now.into(),
            };
            state
                .deliveries
                .insert((*subscriber_id, notification_id), record);
        }

        Ok(())
    }

    async fn mark_delivered(
        &self,
        notification_id: Id,
        subscriber_ids: &[Id],
    ) -> Result<u64, Error> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for subscriber_id in subscriber_ids {
            if let Some(record) = state.deliveries.get_mut(&(*subscriber_id, notification_id)) {
                if !record.is_sent {
                    record.is_sent = true;
                    record.sent_at = Some(now.into());
                    record.updated_at = now.into();
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn mark_read(&self, notification_ids: &[Id]) -> Result<u64, Error> {
        let ids: HashSet<&Id> = notification_ids.iter().collect();
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for record in state
            .deliveries
            .values_mut()
            .filter(|r| ids.contains(&r.notification_id) && !r.is_read)
        {
            record.is_read = true;
            record.read_at = Some(now.into());
            record.updated_at = now.into();
            updated += 1;
        }
        Ok(updated)
    }

    async fn mark_deleted(&self, notification_ids: &[Id]) -> Result<u64, Error> {
        let ids: HashSet<&Id> = notification_ids.iter().collect();
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for record in state
            .deliveries
            .values_mut()
            .filter(|r| ids.contains(&r.notification_id) && !r.is_deleted)
        {
            record.is_deleted = true;
            record.deleted_at = Some(now.into());
            record.updated_at = now.into();
            updated += 1;
        }
        Ok(updated)
    }

    async fn find_delivery_records(
        &self,
        subscriber_id: Id,
        filter: DeliveryFilter,
    ) -> Result<Vec<subscriber_notifications::Model>, Error> {
        let state = self.state.read().await;
        Ok(state
            .deliveries
            .values()
            .filter(|r| r.subscriber_id == subscriber_id && filter.matches(r))
            .cloned()
            .collect())
    }

    async fn find_notifications_page(
        &self,
        topic_ids: Vec<Id>,
        only_ids: Option<Vec<Id>>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<notifications::Model>, u64), Error> {
        let topic_ids: HashSet<Id> = topic_ids.into_iter().collect();
        let only_ids: Option<HashSet<Id>> = only_ids.map(|ids| ids.into_iter().collect());
        let state = self.state.read().await;

        let matching: Vec<&notifications::Model> = state
            .notification_order
            .iter()
            .rev()
            .filter_map(|id| state.notifications.get(id))
            .filter(|n| topic_ids.contains(&n.topic_id))
            .filter(|n| only_ids.as_ref().map_or(true, |ids| ids.contains(&n.id)))
            .collect();

        let limit = limit.max(1) as usize;
        let skip = (page.max(1) as usize - 1).saturating_mul(limit);
        let page = matching
            .iter()
            .skip(skip)
            .take(limit)
            .map(|n| (*n).clone())
            .collect();

        Ok((page, matching.len() as u64))
    }
}

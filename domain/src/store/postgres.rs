use super::{NotificationStore, SubscriptionStore};
use crate::error::Error;
use crate::{notifications, subscriber_notifications, subscriber_topics, subscribers, topics, Id};
use async_trait::async_trait;
use entity_api::delivery::{self, DeliveryFilter};
use entity_api::{notification, subscriber, subscription, topic};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Store adapter over the sea-orm `entity_api` functions.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }
}

#[async_trait]
impl SubscriptionStore for SeaOrmStore {
    async fn find_topic_by_domain(&self, domain: &str) -> Result<Option<topics::Model>, Error> {
        Ok(topic::find_by_domain(self.db_conn_ref(), domain).await?)
    }

    async fn find_topic_by_id(&self, topic_id: Id) -> Result<Option<topics::Model>, Error> {
        Ok(topic::find_by_id(self.db_conn_ref(), topic_id).await?)
    }

    async fn create_topic(
        &self,
        domain: String,
        description: Option<String>,
    ) -> Result<topics::Model, Error> {
        Ok(topic::create(self.db_conn_ref(), domain, description).await?)
    }

    async fn find_subscriptions_by_topic(
        &self,
        topic_id: Id,
    ) -> Result<Vec<subscriber_topics::Model>, Error> {
        Ok(subscription::find_by_topic_id(self.db_conn_ref(), topic_id).await?)
    }

    async fn find_subscriptions_by_subscriber(
        &self,
        subscriber_id: Id,
    ) -> Result<Vec<subscriber_topics::Model>, Error> {
        Ok(subscription::find_by_subscriber_id(self.db_conn_ref(), subscriber_id).await?)
    }

    async fn create_subscription(
        &self,
        subscriber_id: Id,
        topic_id: Id,
    ) -> Result<subscriber_topics::Model, Error> {
        Ok(subscription::create(self.db_conn_ref(), subscriber_id, topic_id).await?)
    }

    async fn delete_subscription(&self, subscriber_id: Id, topic_id: Id) -> Result<bool, Error> {
        let deleted = subscription::delete(self.db_conn_ref(), subscriber_id, topic_id).await?;
        Ok(deleted > 0)
    }

    async fn find_subscriber(
        &self,
        subscriber_id: Id,
    ) -> Result<Option<subscribers::Model>, Error> {
        Ok(subscriber::find_by_id(self.db_conn_ref(), subscriber_id).await?)
    }
}

#[async_trait]
impl NotificationStore for SeaOrmStore {
    async fn create_notification(
        &self,
        topic_id: Id,
        subject: String,
    ) -> Result<notifications::Model, Error> {
        Ok(notification::create(self.db_conn_ref(), topic_id, subject).await?)
    }

    async fn find_notification_by_id(
        &self,
        notification_id: Id,
    ) -> Result<Option<notifications::Model>, Error> {
        Ok(notification::find_by_id(self.db_conn_ref(), notification_id).await?)
    }

    async fn create_delivery_records(
        &self,
        notification_id: Id,
        subscriber_ids: &[Id],
    ) -> Result<(), Error> {
        Ok(delivery::create_for_subscribers(self.db_conn_ref(), notification_id, subscriber_ids).await?)
    }

    async fn mark_delivered(
        &self,
        notification_id: Id,
        subscriber_ids: &[Id],
    ) -> Result<u64, Error> {
        Ok(delivery::mark_sent(self.db_conn_ref(), notification_id, subscriber_ids).await?)
    }

    async fn mark_read(&self, notification_ids: &[Id]) -> Result<u64, Error> {
        Ok(delivery::mark_read(self.db_conn_ref(), notification_ids).await?)
    }

    async fn mark_deleted(&self, notification_ids: &[Id]) -> Result<u64, Error> {
        Ok(delivery::mark_deleted(self.db_conn_ref(), notification_ids).await?)
    }

    async fn find_delivery_records(
        &self,
        subscriber_id: Id,
        filter: DeliveryFilter,
    ) -> Result<Vec<subscriber_notifications::Model>, Error> {
        Ok(delivery::find_by_subscriber(self.db_conn_ref(), subscriber_id, filter).await?)
    }

    async fn find_notifications_page(
        &self,
        topic_ids: Vec<Id>,
        only_ids: Option<Vec<Id>>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<notifications::Model>, u64), Error> {
        Ok(notification::find_page(self.db_conn_ref(), topic_ids, only_ids, page, limit).await?)
    }
}

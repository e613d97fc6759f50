//! Notification use cases behind the HTTP surface: creation with eager
//! delivery records, the read and delete flags, and per-subscriber listing.

use crate::error::{EntityErrorKind, Error, NotificationErrorKind};
use crate::notifications::Model;
use crate::store::{NotificationStore, Stores};
use crate::Id;
use entity_api::delivery::DeliveryFilter;
use log::*;
use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Listing request for one subscriber.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    pub subscriber_id: Id,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub filter: DeliveryFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Model>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl NotificationPage {
    fn empty(page: u64, limit: u64) -> Self {
        Self {
            notifications: Vec::new(),
            total: 0,
            page,
            limit,
        }
    }
}

/// Creates a notification on `topic_id` and one pending delivery record for
/// every subscriber of the topic at this moment.
pub async fn create(stores: &Stores, topic_id: Id, subject: String) -> Result<Model, Error> {
    if subject.trim().is_empty() {
        return Err(Error::entity(EntityErrorKind::Invalid));
    }

    stores
        .subscriptions
        .find_topic_by_id(topic_id)
        .await?
        .ok_or_else(|| Error::notification(NotificationErrorKind::TopicNotFound))?;

    let notification = stores
        .notifications
        .create_notification(topic_id, subject)
        .await?;

    let subscriber_ids: Vec<Id> = stores
        .subscriptions
        .find_subscriptions_by_topic(topic_id)
        .await?
        .into_iter()
        .map(|s| s.subscriber_id)
        .collect();
    stores
        .notifications
        .create_delivery_records(notification.id, &subscriber_ids)
        .await?;

    info!(
        "Created notification {} on topic {topic_id} for {} subscriber(s)",
        notification.id,
        subscriber_ids.len()
    );
    Ok(notification)
}

pub async fn mark_as_read(
    store: &dyn NotificationStore,
    notification_ids: &[Id],
) -> Result<u64, Error> {
    let updated = store.mark_read(notification_ids).await?;
    debug!("Marked {updated} delivery record(s) read");
    Ok(updated)
}

/// Soft-deletes the delivery records of the given notifications.
pub async fn delete(store: &dyn NotificationStore, notification_ids: &[Id]) -> Result<u64, Error> {
    let updated = store.mark_deleted(notification_ids).await?;
    debug!("Marked {updated} delivery record(s) deleted");
    Ok(updated)
}

pub async fn find_for_subscriber(
    stores: &Stores,
    query: NotificationQuery,
) -> Result<NotificationPage, Error> {
    let page = query.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(1);

    let topic_ids: Vec<Id> = stores
        .subscriptions
        .find_subscriptions_by_subscriber(query.subscriber_id)
        .await?
        .into_iter()
        .map(|s| s.topic_id)
        .collect();
    if topic_ids.is_empty() {
        return Ok(NotificationPage::empty(page, limit));
    }

    let only_ids = if query.filter.is_empty() {
        None
    } else {
        let ids: Vec<Id> = stores
            .notifications
            .find_delivery_records(query.subscriber_id, query.filter)
            .await?
            .into_iter()
            .map(|r| r.notification_id)
            .collect();
        if ids.is_empty() {
            return Ok(NotificationPage::empty(page, limit));
        }
        Some(ids)
    };

    let (notifications, total) = stores
        .notifications
        .find_notifications_page(topic_ids, only_ids, page, limit)
        .await?;

    Ok(NotificationPage {
        notifications,
        total,
        page,
        limit,
    })
}

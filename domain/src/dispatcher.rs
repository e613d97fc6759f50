//! Notification fan-out.
//!
//! A dispatch pushes one notification to every subscriber of its topic that
//! holds a live connection at that moment, then flags the delivery records of
//! the subscribers that were actually reached as sent.

use crate::error::{Error, NotificationErrorKind};
use crate::store::{NotificationStore, SubscriptionStore};
use crate::Id;
use futures::future::join_all;
use log::*;
use sse::{ConnectionRegistry, Frame};
use std::collections::HashSet;
use std::sync::Arc;

/// Who a dispatch reached, who it failed to reach and who was offline.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub notification_id: Id,
    pub delivered: Vec<Id>,
    pub failed: Vec<Id>,
    pub offline: Vec<Id>,
}

enum Delivery {
    Written,
    Failed(Error),
    // The connection went away between the snapshot and the write.
    Gone,
}

pub struct Dispatcher {
    registry: ConnectionRegistry,
    subscriptions: Arc<dyn SubscriptionStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl Dispatcher {
    pub fn new(
        registry: ConnectionRegistry,
        subscriptions: Arc<dyn SubscriptionStore>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Self {
        Self {
            registry,
            subscriptions,
            notifications,
        }
    }

    pub async fn dispatch(&self, topic_id: Id, notification_id: Id) -> Result<DispatchReport, Error> {
        self.subscriptions
            .find_topic_by_id(topic_id)
            .await?
            .ok_or_else(|| Error::notification(NotificationErrorKind::TopicNotFound))?;

        let (subscriptions, notification) = tokio::join!(
            self.subscriptions.find_subscriptions_by_topic(topic_id),
            self.notifications.find_notification_by_id(notification_id),
        );

        let subscriptions = subscriptions?;
        if subscriptions.is_empty() {
            return Err(Error::notification(
                NotificationErrorKind::NoSubscribersForTopic,
            ));
        }
        // A notification published on another topic is unknown to this one.
        let notification = notification?
            .filter(|notification| notification.topic_id == topic_id)
            .ok_or_else(|| Error::notification(NotificationErrorKind::NotificationNotFound))?;

        let connected = self.registry.lookup_all();
        let subscribed: HashSet<Id> = subscriptions.iter().map(|s| s.subscriber_id).collect();
        let (mut targets, mut offline): (Vec<Id>, Vec<Id>) = subscribed
            .into_iter()
            .partition(|subscriber_id| connected.contains(subscriber_id));
        targets.sort();

        debug!(
            "Dispatching notification {notification_id} to {} of {} subscriber(s)",
            targets.len(),
            targets.len() + offline.len()
        );

        let frame = Frame::data(notification.subject);
        let deliveries = join_all(
            targets
                .iter()
                .map(|subscriber_id| self.deliver(*subscriber_id, &frame)),
        )
        .await;

        let mut report = DispatchReport {
            notification_id,
            ..Default::default()
        };
        for (subscriber_id, delivery) in targets.into_iter().zip(deliveries) {
            match delivery {
                Delivery::Written => report.delivered.push(subscriber_id),
                Delivery::Failed(e) => {
                    warn!("Delivery of notification {notification_id} to {subscriber_id} failed: {e}");
                    report.failed.push(subscriber_id);
                }
                Delivery::Gone => offline.push(subscriber_id),
            }
        }
        offline.sort();
        report.offline = offline;

        let marked = self
            .notifications
            .mark_delivered(notification_id, &report.delivered)
            .await?;
        info!(
            "Notification {notification_id}: delivered={}, failed={}, offline={}, marked_sent={marked}",
            report.delivered.len(),
            report.failed.len(),
            report.offline.len()
        );

        Ok(report)
    }

    async fn deliver(&self, subscriber_id: Id, frame: &Frame) -> Delivery {
        let Some(connection) = self.registry.connection(&subscriber_id) else {
            return Delivery::Gone;
        };

        match connection.write_frame(frame).await {
            Ok(()) => {
                debug!("Wrote frame to subscriber {subscriber_id}");
                Delivery::Written
            }
            Err(e) => Delivery::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::testing::RecordingConnection;

    struct Scenario {
        store: Arc<MemoryStore>,
        registry: ConnectionRegistry,
        dispatcher: Dispatcher,
        topic_id: Id,
        notification_id: Id,
        a: Id,
        b: Id,
        c: Id,
    }

    /// Topic `orders` with subscribers A, B and C, and "Order shipped" created for it.
    async fn scenario() -> Result<Scenario, Error> {
        let store = Arc::new(MemoryStore::new());
        let orders = store.create_topic("orders".to_owned(), None).await?;
        let a = store.insert_subscriber("A", "a@example.com").await?.id;
        let b = store.insert_subscriber("B", "b@example.com").await?.id;
        let c = store.insert_subscriber("C", "c@example.com").await?.id;
        for subscriber_id in [a, b, c] {
            store.create_subscription(subscriber_id, orders.id).await?;
        }
        let shipped = store
            .create_notification(orders.id, "Order shipped".to_owned())
            .await?;
        store.create_delivery_records(shipped.id, &[a, b, c]).await?;

        let registry = ConnectionRegistry::new();
        let dispatcher = Dispatcher::new(registry.clone(), store.clone(), store.clone());

        Ok(Scenario {
            store,
            registry,
            dispatcher,
            topic_id: orders.id,
            notification_id: shipped.id,
            a,
            b,
            c,
        })
    }

    async fn connect(registry: &ConnectionRegistry, subscriber_id: Id) -> Arc<RecordingConnection> {
        let connection = Arc::new(RecordingConnection::new(subscriber_id));
        registry
            .register(subscriber_id, connection.clone())
            .await
            .unwrap();
        connection
    }

    #[tokio::test]
    async fn only_connected_subscribers_receive_the_frame() -> Result<(), Error> {
        let s = scenario().await?;
        let conn_a = connect(&s.registry, s.a).await;
        let conn_c = connect(&s.registry, s.c).await;

        let report = s.dispatcher.dispatch(s.topic_id, s.notification_id).await?;

        let frame = "data: Order shipped\n\n".to_owned();
        assert_eq!(conn_a.data_frames(), vec![frame.clone()]);
        assert_eq!(conn_c.data_frames(), vec![frame]);
        assert_eq!(report.offline, vec![s.b]);
        assert!(report.failed.is_empty());

        for (subscriber_id, sent) in [(s.a, true), (s.b, false), (s.c, true)] {
            let record = s
                .store
                .delivery_record(subscriber_id, s.notification_id)
                .await
                .unwrap();
            assert_eq!(record.is_sent, sent);
            assert_eq!(record.sent_at.is_some(), sent);
        }
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_is_isolated_and_left_pending() -> Result<(), Error> {
        let s = scenario().await?;
        let conn_a = connect(&s.registry, s.a).await;
        let conn_c = connect(&s.registry, s.c).await;
        conn_c.fail_writes();

        let report = s.dispatcher.dispatch(s.topic_id, s.notification_id).await?;

        assert_eq!(report.delivered, vec![s.a]);
        assert_eq!(report.failed, vec![s.c]);
        assert_eq!(conn_a.data_frames().len(), 1);
        let c_record = s
            .store
            .delivery_record(s.c, s.notification_id)
            .await
            .unwrap();
        assert!(!c_record.is_sent);
        Ok(())
    }

    #[tokio::test]
    async fn removed_connection_is_skipped() -> Result<(), Error> {
        let s = scenario().await?;
        let conn_a = connect(&s.registry, s.a).await;
        s.registry.remove(&s.a);

        let report = s.dispatcher.dispatch(s.topic_id, s.notification_id).await?;

        assert!(report.delivered.is_empty());
        assert!(conn_a.data_frames().is_empty());
        let a_record = s
            .store
            .delivery_record(s.a, s.notification_id)
            .await
            .unwrap();
        assert!(!a_record.is_sent);
        Ok(())
    }

    #[tokio::test]
    async fn connected_but_unsubscribed_subscriber_gets_nothing() -> Result<(), Error> {
        let s = scenario().await?;
        let outsider = s.store.insert_subscriber("D", "d@example.com").await?.id;
        let conn_outsider = connect(&s.registry, outsider).await;

        s.dispatcher.dispatch(s.topic_id, s.notification_id).await?;

        assert!(conn_outsider.data_frames().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn notification_of_another_topic_is_not_dispatched() -> Result<(), Error> {
        let s = scenario().await?;
        let conn_a = connect(&s.registry, s.a).await;
        let billing = s.store.create_topic("billing".to_owned(), None).await?;
        s.store.create_subscription(s.a, billing.id).await?;
        let invoice = s
            .store
            .create_notification(billing.id, "Invoice ready".to_owned())
            .await?;

        let err = s
            .dispatcher
            .dispatch(s.topic_id, invoice.id)
            .await
            .unwrap_err();

        assert_eq!(
            err.notification_kind(),
            Some(&NotificationErrorKind::NotificationNotFound)
        );
        assert!(conn_a.data_frames().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn lookup_failures_abort_the_dispatch() -> Result<(), Error> {
        let s = scenario().await?;
        let empty = s.store.create_topic("billing".to_owned(), None).await?;

        let err = s
            .dispatcher
            .dispatch(Id::new_v4(), s.notification_id)
            .await
            .unwrap_err();
        assert_eq!(
            err.notification_kind(),
            Some(&NotificationErrorKind::TopicNotFound)
        );

        let err = s
            .dispatcher
            .dispatch(empty.id, s.notification_id)
            .await
            .unwrap_err();
        assert_eq!(
            err.notification_kind(),
            Some(&NotificationErrorKind::NoSubscribersForTopic)
        );

        let err = s
            .dispatcher
            .dispatch(s.topic_id, Id::new_v4())
            .await
            .unwrap_err();
        assert_eq!(
            err.notification_kind(),
            Some(&NotificationErrorKind::NotificationNotFound)
        );
        Ok(())
    }
}

//! Queue intake.
//!
//! HTTP handlers only enqueue work through the `enqueue_*` helpers; the
//! consumers spawned here pull one message at a time per queue and hand it to
//! the dispatcher or the reconciler. Handler errors and panics are logged and
//! the message is dropped. Redelivery is left to the broker.

use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::reconciler::{Reconciler, SubscriptionIntent};
use crate::Id;
use events::{
    InMemoryBroker, NotifySubscriberMessage, QueueConsumer, QueueMessage, QueueName,
    QueuePublisher, SubscriberRef, TopicSubscriptionMessage,
};
use log::*;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Publish a `notify-subscriber` work item.
pub async fn enqueue_notify(
    publisher: &dyn QueuePublisher,
    topic_id: Id,
    notification_id: Id,
) -> Result<(), Error> {
    debug!("Enqueueing dispatch of notification {notification_id} on topic {topic_id}");
    publisher
        .publish(
            NotifySubscriberMessage {
                topic_id,
                notification_id,
            }
            .into(),
        )
        .await?;
    Ok(())
}

/// Publish a `topic-subscription` work item.
pub async fn enqueue_subscription(
    publisher: &dyn QueuePublisher,
    domain: String,
    subscriber_ids: Vec<Id>,
) -> Result<(), Error> {
    debug!(
        "Enqueueing subscription of {} subscriber(s) to {domain}",
        subscriber_ids.len()
    );
    publisher
        .publish(
            TopicSubscriptionMessage {
                domain,
                subscribers: subscriber_ids
                    .into_iter()
                    .map(|sub_id| SubscriberRef { sub_id })
                    .collect(),
            }
            .into(),
        )
        .await?;
    Ok(())
}

#[derive(Clone)]
pub struct QueueIntake {
    reconciler: Arc<Reconciler>,
    dispatcher: Arc<Dispatcher>,
}

impl QueueIntake {
    pub fn new(reconciler: Arc<Reconciler>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            reconciler,
            dispatcher,
        }
    }

    /// Runs the handler for a single decoded message.
    pub async fn handle(&self, message: QueueMessage) -> Result<(), Error> {
        match message {
            QueueMessage::NotifySubscriber(NotifySubscriberMessage {
                topic_id,
                notification_id,
            }) => {
                self.dispatcher.dispatch(topic_id, notification_id).await?;
                Ok(())
            }
            QueueMessage::TopicSubscription(message) => {
                let intent = SubscriptionIntent::from(message);
                let report = self.reconciler.reconcile_intent(intent).await;
                report.results.map(|_| ())
            }
        }
    }

    /// Drains `consumer` until its queue closes.
    pub async fn consume(&self, mut consumer: QueueConsumer) {
        let queue = consumer.queue();
        info!("Consuming queue {queue}");

        while let Some(payload) = consumer.next().await {
            let message = match QueueMessage::decode(queue, &payload) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Dropping malformed message on {queue}: {e}");
                    continue;
                }
            };

            // Each message runs in its own task so a panicking handler only
            // loses that message.
            let intake = self.clone();
            match tokio::spawn(async move { intake.handle(message).await }).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Handler for queue {queue} failed: {e}"),
                Err(e) => error!("Handler for queue {queue} aborted: {e}"),
            }
        }

        info!("Queue {queue} closed, consumer stopped");
    }

    /// Spawns one consumer task per queue the broker still has a consumer for.
    pub fn spawn_consumers(self: Arc<Self>, broker: &InMemoryBroker) -> Vec<JoinHandle<()>> {
        QueueName::ALL
            .into_iter()
            .filter_map(|queue| broker.take_consumer(queue))
            .map(|consumer| {
                let intake = Arc::clone(&self);
                tokio::spawn(async move { intake.consume(consumer).await })
            })
            .collect()
    }
}

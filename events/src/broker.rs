use crate::error::Error;
use crate::message::{QueueMessage, QueueName};
use async_trait::async_trait;
use log::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Producer side of the queue transport.
///
/// Implementations only have to move raw payloads; encoding is shared through
/// the provided `publish` method so every transport emits the same JSON documents.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    async fn publish_raw(&self, queue: QueueName, payload: Vec<u8>) -> Result<(), Error>;

    /// Encode `message` and publish it on the queue it belongs to.
    async fn publish(&self, message: QueueMessage) -> Result<(), Error> {
        let payload = message.encode()?;
        self.publish_raw(message.queue(), payload).await
    }
}

/// Process-local queue transport with one FIFO per named queue.
///
/// Each queue has exactly one consumer which is handed out once through
/// `take_consumer`. Payloads published before the consumer starts are buffered.
#[derive(Clone)]
pub struct InMemoryBroker {
    senders: Arc<HashMap<QueueName, UnboundedSender<Vec<u8>>>>,
    receivers: Arc<Mutex<HashMap<QueueName, UnboundedReceiver<Vec<u8>>>>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();

        for queue in QueueName::ALL {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(queue, tx);
            receivers.insert(queue, rx);
        }

        Self {
            senders: Arc::new(senders),
            receivers: Arc::new(Mutex::new(receivers)),
        }
    }

    /// Detach the consumer for `queue`. Returns `None` once it has been taken.
    pub fn take_consumer(&self, queue: QueueName) -> Option<QueueConsumer> {
        let mut receivers = match self.receivers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        receivers
            .remove(&queue)
            .map(|receiver| QueueConsumer { queue, receiver })
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueuePublisher for InMemoryBroker {
    async fn publish_raw(&self, queue: QueueName, payload: Vec<u8>) -> Result<(), Error> {
        let sender = self
            .senders
            .get(&queue)
            .ok_or_else(|| Error::queue_closed(queue))?;

        sender.send(payload).map_err(|_| {
            warn!("Dropping message for queue {queue}: consumer is gone");
            Error::queue_closed(queue)
        })?;

        trace!("Published message on queue {queue}");
        Ok(())
    }
}

/// Consumer side of one named queue. Yields payloads one at a time in FIFO order.
pub struct QueueConsumer {
    queue: QueueName,
    receiver: UnboundedReceiver<Vec<u8>>,
}

impl QueueConsumer {
    pub fn queue(&self) -> QueueName {
        self.queue
    }

    /// Wait for the next payload. `None` means every producer has been dropped.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{NotifySubscriberMessage, TopicSubscriptionMessage};
    use crate::Id;

    #[tokio::test]
    async fn payloads_are_routed_to_their_queue_in_order() {
        let broker = InMemoryBroker::new();
        let mut notify = broker.take_consumer(QueueName::NotifySubscriber).unwrap();
        let mut subscribe = broker.take_consumer(QueueName::TopicSubscription).unwrap();

        let first = NotifySubscriberMessage {
            topic_id: Id::new_v4(),
            notification_id: Id::new_v4(),
        };
        let second = NotifySubscriberMessage {
            topic_id: Id::new_v4(),
            notification_id: Id::new_v4(),
        };
        let intent = TopicSubscriptionMessage {
            domain: "orders".to_string(),
            subscribers: vec![],
        };

        broker.publish(first.clone().into()).await.unwrap();
        broker.publish(intent.clone().into()).await.unwrap();
        broker.publish(second.clone().into()).await.unwrap();

        let received = notify.next().await.unwrap();
        assert_eq!(
            QueueMessage::decode(notify.queue(), &received).unwrap(),
            QueueMessage::from(first)
        );
        let received = notify.next().await.unwrap();
        assert_eq!(
            QueueMessage::decode(notify.queue(), &received).unwrap(),
            QueueMessage::from(second)
        );
        let received = subscribe.next().await.unwrap();
        assert_eq!(
            QueueMessage::decode(subscribe.queue(), &received).unwrap(),
            QueueMessage::from(intent)
        );
    }

    #[test]
    fn consumer_can_only_be_taken_once() {
        let broker = InMemoryBroker::new();

        assert!(broker.take_consumer(QueueName::NotifySubscriber).is_some());
        assert!(broker.take_consumer(QueueName::NotifySubscriber).is_none());
    }

    #[tokio::test]
    async fn publishing_after_consumer_is_dropped_fails() {
        let broker = InMemoryBroker::new();
        drop(broker.take_consumer(QueueName::TopicSubscription));

        let result = broker
            .publish_raw(QueueName::TopicSubscription, b"{}".to_vec())
            .await;

        assert!(result.is_err());
    }
}

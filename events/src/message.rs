use crate::error::{Error, EventsErrorKind};
use crate::Id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The durable queues the notification hub produces to and consumes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueName {
    NotifySubscriber,
    TopicSubscription,
}

impl QueueName {
    pub const ALL: [QueueName; 2] = [QueueName::NotifySubscriber, QueueName::TopicSubscription];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::NotifySubscriber => "notify-subscriber",
            QueueName::TopicSubscription => "topic-subscription",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueName {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "notify-subscriber" => Ok(QueueName::NotifySubscriber),
            "topic-subscription" => Ok(QueueName::TopicSubscription),
            other => Err(Error {
                source: None,
                error_kind: EventsErrorKind::UnknownQueue(other.to_string()),
            }),
        }
    }
}

/// Payload of the `notify-subscriber` queue: push one notification to the
/// currently connected subscribers of its topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifySubscriberMessage {
    pub topic_id: Id,
    pub notification_id: Id,
}

/// A subscriber reference as carried on the wire (`{"subId": "..."}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRef {
    #[serde(rename = "subId")]
    pub sub_id: Id,
}

/// Payload of the `topic-subscription` queue: subscribe a batch of
/// subscribers to the topic identified by `domain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSubscriptionMessage {
    pub domain: String,
    pub subscribers: Vec<SubscriberRef>,
}

/// Every unit of work that travels over a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueMessage {
    NotifySubscriber(NotifySubscriberMessage),
    TopicSubscription(TopicSubscriptionMessage),
}

impl QueueMessage {
    /// The queue this message is routed to.
    pub fn queue(&self) -> QueueName {
        match self {
            QueueMessage::NotifySubscriber(_) => QueueName::NotifySubscriber,
            QueueMessage::TopicSubscription(_) => QueueName::TopicSubscription,
        }
    }

    /// Serializes the message body into the JSON payload published on its queue.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let encoded = match self {
            QueueMessage::NotifySubscriber(body) => serde_json::to_vec(body),
            QueueMessage::TopicSubscription(body) => serde_json::to_vec(body),
        };

        encoded.map_err(|err| Error {
            source: Some(Box::new(err)),
            error_kind: EventsErrorKind::Encode,
        })
    }

    /// Decodes a raw payload received from `queue`. The queue name decides
    /// which message shape is expected.
    pub fn decode(queue: QueueName, payload: &[u8]) -> Result<Self, Error> {
        let decoded = match queue {
            QueueName::NotifySubscriber => {
                serde_json::from_slice(payload).map(QueueMessage::NotifySubscriber)
            }
            QueueName::TopicSubscription => {
                serde_json::from_slice(payload).map(QueueMessage::TopicSubscription)
            }
        };

        decoded.map_err(|err| Error {
            source: Some(Box::new(err)),
            error_kind: EventsErrorKind::Decode(queue),
        })
    }
}

impl From<NotifySubscriberMessage> for QueueMessage {
    fn from(message: NotifySubscriberMessage) -> Self {
        QueueMessage::NotifySubscriber(message)
    }
}

impl From<TopicSubscriptionMessage> for QueueMessage {
    fn from(message: TopicSubscriptionMessage) -> Self {
        QueueMessage::TopicSubscription(message)
    }
}

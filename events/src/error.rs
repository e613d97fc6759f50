//! Error types for the `events` crate.
use std::error::Error as StdError;
use std::fmt;

use crate::message::QueueName;

/// Errors raised while encoding, decoding or transporting queue messages.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: EventsErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum EventsErrorKind {
    // Message could not be serialized into a queue payload
    Encode,
    // Queue payload is not a valid message for its queue
    Decode(QueueName),
    // No consumer is attached to the queue anymore
    QueueClosed(QueueName),
    // Queue name is not one this transport knows about
    UnknownQueue(String),
}

impl Error {
    pub(crate) fn queue_closed(queue: QueueName) -> Self {
        Error {
            source: None,
            error_kind: EventsErrorKind::QueueClosed(queue),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            EventsErrorKind::Encode => write!(f, "Events Error: failed to encode queue message"),
            EventsErrorKind::Decode(queue) => {
                write!(f, "Events Error: malformed payload on queue {queue}")
            }
            EventsErrorKind::QueueClosed(queue) => {
                write!(f, "Events Error: queue {queue} is closed")
            }
            EventsErrorKind::UnknownQueue(name) => {
                write!(f, "Events Error: unknown queue {name}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

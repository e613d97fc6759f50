//! Error types for the `sse` crate.
use std::error::Error as StdError;
use std::fmt;

use crate::connection::SubscriberId;

/// Errors raised while establishing or writing to live connections.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: SseErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum SseErrorKind {
    // The subscriber asking for a stream does not exist
    SubscriberNotFound(SubscriberId),
    // The subscriber directory could not be consulted
    Lookup,
    // The frame could not be written because the stream is gone
    Write(SubscriberId),
}

impl Error {
    pub fn subscriber_not_found(subscriber_id: SubscriberId) -> Self {
        Error {
            source: None,
            error_kind: SseErrorKind::SubscriberNotFound(subscriber_id),
        }
    }

    pub fn lookup(source: Box<dyn StdError + Send + Sync>) -> Self {
        Error {
            source: Some(source),
            error_kind: SseErrorKind::Lookup,
        }
    }

    pub fn write(subscriber_id: SubscriberId) -> Self {
        Error {
            source: None,
            error_kind: SseErrorKind::Write(subscriber_id),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            SseErrorKind::SubscriberNotFound(id) => {
                write!(f, "SSE Error: subscriber {id} not found")
            }
            SseErrorKind::Lookup => write!(f, "SSE Error: subscriber lookup failed"),
            SseErrorKind::Write(id) => {
                write!(f, "SSE Error: failed to write frame to subscriber {id}")
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

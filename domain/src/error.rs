//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use events::error::{Error as EventsError, EventsErrorKind};
use sse::error::{Error as SseError, SseErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. Ultimately the various `error_kind`s are used by `web` to
/// return appropriate HTTP status codes and by the queue consumers to log outcomes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Notification(NotificationErrorKind),
    Other(String),
}

/// Enum representing the various kinds of entity errors that can bubble up from the "Entity"
/// layer (`entity_api` and `entity`), reduced to what the `domain` layer cares about.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    Duplicate,
    DbTransaction,
    Other(String),
}

/// Failures of the fan-out and subscription engine.
#[derive(Debug, PartialEq)]
pub enum NotificationErrorKind {
    TopicNotFound,
    NotificationNotFound,
    SubscriberNotFound,
    AlreadySubscribed,
    NoSubscribersForTopic,
    DeliveryWriteFailure,
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Queue,
    Other(String),
}

impl Error {
    pub fn notification(kind: NotificationErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Notification(kind)),
        }
    }

    pub fn entity(kind: EntityErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(kind)),
        }
    }

    /// The engine failure this error represents, if it is one.
    pub fn notification_kind(&self) -> Option<&NotificationErrorKind> {
        match &self.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Notification(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.error_kind
            == DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Duplicate))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}", self.error_kind)?;
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::InvalidQueryTerm => EntityErrorKind::Invalid,
            EntityApiErrorKind::RecordAlreadyExists => EntityErrorKind::Duplicate,
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
            EntityApiErrorKind::Other => EntityErrorKind::Other("EntityErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<EventsError> for Error {
    fn from(err: EventsError) -> Self {
        let error_kind = match err.error_kind {
            EventsErrorKind::QueueClosed(_) | EventsErrorKind::UnknownQueue(_) => {
                DomainErrorKind::External(ExternalErrorKind::Queue)
            }
            EventsErrorKind::Encode | EventsErrorKind::Decode(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<SseError> for Error {
    fn from(err: SseError) -> Self {
        let error_kind = match err.error_kind {
            SseErrorKind::SubscriberNotFound(_) => DomainErrorKind::Internal(
                InternalErrorKind::Notification(NotificationErrorKind::SubscriberNotFound),
            ),
            SseErrorKind::Write(_) => DomainErrorKind::Internal(InternalErrorKind::Notification(
                NotificationErrorKind::DeliveryWriteFailure,
            )),
            SseErrorKind::Lookup => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_records_translate_to_duplicate_kind() {
        let err: Error = EntityApiError::already_exists().into();

        assert!(err.is_duplicate());
        assert_eq!(err.notification_kind(), None);
    }

    #[test]
    fn missing_records_translate_to_not_found() {
        let err: Error = EntityApiError::not_found().into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
    }

    #[test]
    fn write_failures_translate_to_delivery_write_failure() {
        let err: Error = SseError::write(entity_api::Id::new_v4()).into();

        assert_eq!(
            err.notification_kind(),
            Some(&NotificationErrorKind::DeliveryWriteFailure)
        );
    }

    #[test]
    fn closed_queues_are_external_errors() {
        let err: Error = EventsError {
            source: None,
            error_kind: EventsErrorKind::QueueClosed(events::QueueName::NotifySubscriber),
        }
        .into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Queue)
        );
    }
}

use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
    NotificationErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound => StatusCode::NOT_FOUND,
                    EntityErrorKind::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
                    EntityErrorKind::Duplicate => StatusCode::CONFLICT,
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                },
                InternalErrorKind::Notification(notification_error_kind) => {
                    match notification_error_kind {
                        NotificationErrorKind::TopicNotFound
                        | NotificationErrorKind::NotificationNotFound
                        | NotificationErrorKind::SubscriberNotFound => StatusCode::NOT_FOUND,
                        NotificationErrorKind::AlreadySubscribed => StatusCode::CONFLICT,
                        NotificationErrorKind::NoSubscribersForTopic => {
                            StatusCode::UNPROCESSABLE_ENTITY
                        }
                        NotificationErrorKind::DeliveryWriteFailure => {
                            StatusCode::INTERNAL_SERVER_ERROR
                        }
                    }
                }
                InternalErrorKind::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Queue => StatusCode::SERVICE_UNAVAILABLE,
                ExternalErrorKind::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else {
            debug!("Request rejected with {status}: {self}");
        }

        let reason = status.canonical_reason().unwrap_or("UNKNOWN").to_uppercase();
        (status, reason).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        Error::from(err).into_response().status()
    }

    #[test]
    fn engine_lookup_failures_are_not_found() {
        assert_eq!(
            status_of(DomainError::notification(NotificationErrorKind::TopicNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::notification(
                NotificationErrorKind::SubscriberNotFound
            )),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn duplicates_are_conflicts() {
        assert_eq!(
            status_of(DomainError::entity(EntityErrorKind::Duplicate)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::notification(
                NotificationErrorKind::AlreadySubscribed
            )),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn unavailable_queue_is_service_unavailable() {
        let err = DomainError {
            source: None,
            error_kind: DomainErrorKind::External(ExternalErrorKind::Queue),
        };

        assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    }
}

//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use sea_orm::error::{DbErr, SqlErr};

/// Errors while executing operations related to entities.
/// The intent is to categorize errors into two major types:
///  * Errors related to data. Ex DbError::RecordNotFound
///  * Errors related to interactions with the database itself. Ex DbError::Conn
#[derive(Debug, PartialEq)]
pub struct Error {
    // Underlying error emitted from seaORM internals
    pub source: Option<DbErr>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    // Invalid search term
    InvalidQueryTerm,
    // Record not found
    RecordNotFound,
    // A unique constraint rejected the record
    RecordAlreadyExists,
    // Errors related to interactions with the database itself. Ex DbError::Conn
    SystemError,
    // Other errors
    Other,
}

impl Error {
    pub fn not_found() -> Self {
        Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        }
    }

    pub fn already_exists() -> Self {
        Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordAlreadyExists,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity API Error: {:?}", self)
    }
}

impl StdError for Error {}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
            return Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::RecordAlreadyExists,
            };
        }

        match err {
            DbErr::RecordNotFound(_) => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::RecordNotFound,
            },
            DbErr::Type(_) | DbErr::Json(_) => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::InvalidQueryTerm,
            },
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) | DbErr::Exec(_) | DbErr::Query(_) => {
                Error {
                    source: Some(err),
                    error_kind: EntityApiErrorKind::SystemError,
                }
            }
            _ => Error {
                source: Some(err),
                error_kind: EntityApiErrorKind::Other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_maps_to_record_not_found_kind() {
        let err: Error = DbErr::RecordNotFound("topic".to_string()).into();
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotFound);
    }

    #[test]
    fn custom_errors_map_to_other_kind() {
        let err: Error = DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.error_kind, EntityApiErrorKind::Other);
    }
}

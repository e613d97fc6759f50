use uuid::Uuid;

pub mod prelude;

pub mod notifications;
pub mod subscriber_notifications;
pub mod subscriber_topics;
pub mod subscribers;
pub mod topics;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;

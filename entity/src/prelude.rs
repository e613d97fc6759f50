pub use super::notifications::Entity as Notifications;
pub use super::subscriber_notifications::Entity as SubscriberNotifications;
pub use super::subscriber_topics::Entity as SubscriberTopics;
pub use super::subscribers::Entity as Subscribers;
pub use super::topics::Entity as Topics;

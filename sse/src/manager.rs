use crate::connection::{ChannelConnection, ConnectionRegistry, Registration, SubscriberId};
use crate::error::Error;
use async_trait::async_trait;
use axum::response::sse::Event;
use log::*;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// The single piece of storage-backed lookup the SSE layer needs: whether a
/// subscriber exists. Each storage adapter provides it.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    async fn subscriber_exists(&self, subscriber_id: SubscriberId) -> Result<bool, Error>;
}

/// Entry point used by the HTTP layer to open subscriber streams.
pub struct Manager {
    registry: ConnectionRegistry,
    directory: Arc<dyn SubscriberDirectory>,
}

impl Manager {
    pub fn new(registry: ConnectionRegistry, directory: Arc<dyn SubscriberDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Verify the subscriber exists, then register the channel as its live connection.
    pub async fn establish(
        &self,
        subscriber_id: SubscriberId,
        sender: UnboundedSender<Result<Event, Infallible>>,
    ) -> Result<Registration, Error> {
        if !self.directory.subscriber_exists(subscriber_id).await? {
            warn!("Refusing SSE connection for unknown subscriber {subscriber_id}");
            return Err(Error::subscriber_not_found(subscriber_id));
        }

        let connection = Arc::new(ChannelConnection::new(subscriber_id, sender));
        self.registry.register(subscriber_id, connection).await
    }
}

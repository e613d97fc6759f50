use crate::error::Error;
use crate::frame::Frame;
use async_trait::async_trait;
use axum::response::sse::Event;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Subscribers are keyed by the same id type the entity layer uses.
pub type SubscriberId = events::Id;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The narrow contract the registry and the dispatcher rely on. Nothing
/// outside of an implementation knows which transport sits behind it.
#[async_trait]
pub trait LiveConnection: Send + Sync {
    /// Write one frame to the remote side.
    async fn write_frame(&self, frame: &Frame) -> Result<(), Error>;

    /// Resolves once the remote side has gone away.
    async fn closed(&self);

    fn is_closed(&self) -> bool;
}

/// A live connection backed by the channel feeding an axum SSE response stream.
pub struct ChannelConnection {
    subscriber_id: SubscriberId,
    sender: UnboundedSender<Result<Event, Infallible>>,
}

impl ChannelConnection {
    pub fn new(
        subscriber_id: SubscriberId,
        sender: UnboundedSender<Result<Event, Infallible>>,
    ) -> Self {
        Self {
            subscriber_id,
            sender,
        }
    }
}

#[async_trait]
impl LiveConnection for ChannelConnection {
    async fn write_frame(&self, frame: &Frame) -> Result<(), Error> {
        self.sender
            .send(Ok(frame.to_event()))
            .map_err(|_| Error::write(self.subscriber_id))
    }

    async fn closed(&self) {
        self.sender.closed().await
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered(ConnectionId),
    /// A live stream already exists for the subscriber and was left untouched.
    AlreadyConnected,
}

struct LiveEntry {
    connection_id: ConnectionId,
    connection: Arc<dyn LiveConnection>,
}

/// Process-local registry holding at most one live connection per subscriber.
///
/// Cloning is cheap and every clone shares the same map, so one instance is
/// created at startup and handed to both the SSE endpoint and the dispatcher.
/// The map is only mutated through `register` and `remove`.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<SubscriberId, LiveEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `connection` for `subscriber_id` unless a live one is already
    /// registered, in which case this is a no-op. A newly stored connection
    /// gets a close observer and the handshake frame.
    pub async fn register(
        &self,
        subscriber_id: SubscriberId,
        connection: Arc<dyn LiveConnection>,
    ) -> Result<Registration, Error> {
        let connection_id = ConnectionId::new();
        let entry = LiveEntry {
            connection_id,
            connection: Arc::clone(&connection),
        };

        // The shard guard must be released before the first await below.
        match self.connections.entry(subscriber_id) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().connection.is_closed() {
                    debug!("Subscriber {subscriber_id} already holds a live connection");
                    return Ok(Registration::AlreadyConnected);
                }
                debug!("Replacing closed connection for subscriber {subscriber_id}");
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
        }

        self.observe_close(subscriber_id, connection_id, Arc::clone(&connection));

        if let Err(e) = connection
            .write_frame(&Frame::handshake(subscriber_id))
            .await
        {
            warn!("Handshake to subscriber {subscriber_id} failed: {e}");
            self.remove_connection(subscriber_id, connection_id);
            return Err(e);
        }

        info!("Registered SSE connection {connection_id} for subscriber {subscriber_id}");
        Ok(Registration::Registered(connection_id))
    }

    /// Snapshot of the subscribers currently holding a connection.
    pub fn lookup_all(&self) -> HashSet<SubscriberId> {
        self.connections.iter().map(|entry| *entry.key()).collect()
    }

    /// Handle to the live connection of `subscriber_id`, if any.
    pub fn connection(&self, subscriber_id: &SubscriberId) -> Option<Arc<dyn LiveConnection>> {
        self.connections
            .get(subscriber_id)
            .map(|entry| Arc::clone(&entry.connection))
    }

    /// Drop the connection of `subscriber_id`. Removing an absent key is a no-op.
    pub fn remove(&self, subscriber_id: &SubscriberId) -> bool {
        let removed = self.connections.remove(subscriber_id).is_some();
        if removed {
            info!("Removed SSE connection for subscriber {subscriber_id}");
        }
        removed
    }

    pub fn is_connected(&self, subscriber_id: &SubscriberId) -> bool {
        self.connections.contains_key(subscriber_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    // Only removes the entry if it still belongs to `connection_id`, so a late
    // observer never evicts a connection that replaced it.
    fn remove_connection(&self, subscriber_id: SubscriberId, connection_id: ConnectionId) {
        if self
            .connections
            .remove_if(&subscriber_id, |_, entry| {
                entry.connection_id == connection_id
            })
            .is_some()
        {
            info!("SSE connection {connection_id} for subscriber {subscriber_id} closed");
        }
    }

    fn observe_close(
        &self,
        subscriber_id: SubscriberId,
        connection_id: ConnectionId,
        connection: Arc<dyn LiveConnection>,
    ) {
        let registry = self.clone();
        tokio::spawn(async move {
            connection.closed().await;
            registry.remove_connection(subscriber_id, connection_id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::sync::{mpsc, Notify};

    /// Connection double recording every frame written to it.
    #[derive(Default)]
    struct RecordingConnection {
        frames: Mutex<Vec<String>>,
        closed: AtomicBool,
        close_signal: Notify,
    }

    impl RecordingConnection {
        fn frames(&self) -> Vec<String> {
            self.frames.lock().unwrap().clone()
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
            self.close_signal.notify_waiters();
        }
    }

    #[async_trait]
    impl LiveConnection for RecordingConnection {
        async fn write_frame(&self, frame: &Frame) -> Result<(), Error> {
            self.frames.lock().unwrap().push(frame.encode());
            Ok(())
        }

        async fn closed(&self) {
            let notified = self.close_signal.notified();
            if self.is_closed() {
                return;
            }
            notified.await
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn register_twice_keeps_one_entry_and_one_handshake() {
        let registry = ConnectionRegistry::new();
        let subscriber_id = SubscriberId::new_v4();
        let first = Arc::new(RecordingConnection::default());
        let second = Arc::new(RecordingConnection::default());

        let registration = registry
            .register(subscriber_id, first.clone())
            .await
            .unwrap();
        assert!(matches!(registration, Registration::Registered(_)));

        let registration = registry
            .register(subscriber_id, second.clone())
            .await
            .unwrap();
        assert_eq!(registration, Registration::AlreadyConnected);

        assert_eq!(registry.len(), 1);
        assert_eq!(first.frames(), vec![Frame::handshake(subscriber_id).encode()]);
        assert!(second.frames().is_empty());
    }

    #[tokio::test]
    async fn close_observer_removes_the_entry() {
        let registry = ConnectionRegistry::new();
        let subscriber_id = SubscriberId::new_v4();
        let connection = Arc::new(RecordingConnection::default());

        registry
            .register(subscriber_id, connection.clone())
            .await
            .unwrap();
        assert!(registry.is_connected(&subscriber_id));

        connection.close();
        settle().await;

        assert!(!registry.is_connected(&subscriber_id));
        assert!(registry.lookup_all().is_empty());
    }

    #[tokio::test]
    async fn closed_connection_is_replaced_and_late_observer_keeps_the_new_one() {
        let registry = ConnectionRegistry::new();
        let subscriber_id = SubscriberId::new_v4();
        let stale = Arc::new(RecordingConnection::default());
        let fresh = Arc::new(RecordingConnection::default());

        registry.register(subscriber_id, stale.clone()).await.unwrap();
        stale.close();

        // Registering before the observer had a chance to run replaces the stale entry.
        let registration = registry.register(subscriber_id, fresh.clone()).await.unwrap();
        assert!(matches!(registration, Registration::Registered(_)));
        settle().await;

        assert!(registry.is_connected(&subscriber_id));
        assert_eq!(fresh.frames().len(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let subscriber_id = SubscriberId::new_v4();

        registry
            .register(subscriber_id, Arc::new(RecordingConnection::default()))
            .await
            .unwrap();

        assert!(registry.remove(&subscriber_id));
        assert!(!registry.remove(&subscriber_id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn lookup_all_lists_every_connected_subscriber() {
        let registry = ConnectionRegistry::new();
        let a = SubscriberId::new_v4();
        let c = SubscriberId::new_v4();

        registry
            .register(a, Arc::new(RecordingConnection::default()))
            .await
            .unwrap();
        registry
            .register(c, Arc::new(RecordingConnection::default()))
            .await
            .unwrap();

        assert_eq!(registry.lookup_all(), HashSet::from([a, c]));
    }

    #[tokio::test]
    async fn channel_connection_is_removed_when_the_stream_is_dropped() {
        let registry = ConnectionRegistry::new();
        let subscriber_id = SubscriberId::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();

        registry
            .register(
                subscriber_id,
                Arc::new(ChannelConnection::new(subscriber_id, tx)),
            )
            .await
            .unwrap();
        assert!(rx.recv().await.is_some(), "handshake should be queued");

        drop(rx);
        settle().await;

        assert!(!registry.is_connected(&subscriber_id));
    }

    #[tokio::test]
    async fn channel_connection_write_fails_once_receiver_is_gone() {
        let subscriber_id = SubscriberId::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = ChannelConnection::new(subscriber_id, tx);
        drop(rx);

        let err = connection
            .write_frame(&Frame::data("Order shipped"))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            crate::error::SseErrorKind::Write(subscriber_id)
        );
        assert!(connection.is_closed());
    }
}

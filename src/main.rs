//! Notification hub binary.
//!
//! Builds the storage adapter chosen in the config, starts the queue
//! consumers and serves the HTTP and SSE surface.

use domain::store::memory::MemoryStore;
use domain::store::postgres::SeaOrmStore;
use domain::{Dispatcher, QueueIntake, Reconciler, Stores};
use events::InMemoryBroker;
use log::*;
use migration::{Migrator, MigratorTrait};
use service::config::{Config, StorageBackend};
use service::logging::Logger;
use sse::{ConnectionRegistry, Manager};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!(
        "Starting notification hub [{}] with {} storage...",
        config.runtime_env(),
        config.storage_backend
    );

    let stores = match build_stores(&config).await {
        Ok(stores) => stores,
        Err(e) => {
            error!("Failed to initialize storage: {e}");
            std::process::exit(1);
        }
    };

    let registry = ConnectionRegistry::new();
    let sse_manager = Arc::new(Manager::new(
        registry.clone(),
        stores.subscriber_directory(),
    ));

    let broker = InMemoryBroker::new();
    let reconciler = Arc::new(Reconciler::new(
        stores.subscriptions.clone(),
        config.resubscribe_policy,
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        stores.subscriptions.clone(),
        stores.notifications.clone(),
    ));
    let consumers = Arc::new(QueueIntake::new(reconciler, dispatcher)).spawn_consumers(&broker);
    debug!("Spawned {} queue consumer(s)", consumers.len());

    let app_state = web::AppState::new(config, stores, sse_manager, Arc::new(broker));

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}

async fn build_stores(config: &Config) -> Result<Stores, Box<dyn std::error::Error>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage, nothing survives a restart");
            let store = MemoryStore::new();
            if !config.is_production() {
                store.seed().await?;
            }
            Ok(Stores::new(Arc::new(store)))
        }
        StorageBackend::Postgres => {
            let db = service::init_database(config).await?;
            Migrator::up(&db, None).await?;
            Ok(Stores::new(Arc::new(SeaOrmStore::new(Arc::new(db)))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use domain::SubscriptionStore;

    #[tokio::test]
    async fn memory_backend_builds_seeded_stores() {
        let config = Config::parse_from(["notification_hub", "--storage-backend", "memory"]);

        let stores = build_stores(&config).await.unwrap();

        assert!(stores
            .subscriptions
            .find_topic_by_domain("orders")
            .await
            .unwrap()
            .is_some());
    }
}

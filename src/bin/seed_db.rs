use log::{error, info, warn};
use service::config::{Config, StorageBackend};
use service::logging::Logger;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    if config.storage_backend == StorageBackend::Memory {
        warn!("Storage backend is memory, there is nothing to seed. The server seeds itself on start outside production.");
        return;
    }

    info!("Seeding database [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = entity_api::seed_database(&db).await {
        error!("Failed to seed database: {e}");
        std::process::exit(1);
    }

    info!("Database seeded");
}

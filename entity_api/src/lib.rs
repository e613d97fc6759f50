use sea_orm::DatabaseConnection;

pub use entity::{
    notifications, subscriber_notifications, subscriber_topics, subscribers, topics, Id,
};

pub mod delivery;
pub mod error;
pub mod notification;
pub mod subscriber;
pub mod subscription;
pub mod topic;

/// Seeds a development database with a handful of subscribers, the `orders`
/// topic and a subscription for the first subscriber.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let alice = subscriber::create(db, "Alice".to_owned(), "alice@example.com".to_owned()).await?;
    let _bob = subscriber::create(db, "Bob".to_owned(), "bob@example.com".to_owned()).await?;
    let _carol = subscriber::create(db, "Carol".to_owned(), "carol@example.com".to_owned()).await?;

    let orders = topic::create(
        db,
        "orders".to_owned(),
        Some("Order lifecycle updates".to_owned()),
    )
    .await?;
    let _billing = topic::create(db, "billing".to_owned(), None).await?;

    subscription::create(db, alice.id, orders.id).await?;

    Ok(())
}

//! Entity API for the subscriber_topics junction table.
//!
//! The table carries a unique index on (subscriber_id, topic_id), so a second
//! insert for the same pair fails with `RecordAlreadyExists`.

use entity::subscriber_topics::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, Condition, DatabaseConnection, TryIntoModel,
};

use log::*;

use super::error::Error;

/// Creates a subscription of `subscriber_id` to `topic_id`.
///
/// # Errors
///
/// Returns `Error` if the insert fails (e.g., the pair is already subscribed
/// or a foreign key constraint is violated).
pub async fn create(
    db: &DatabaseConnection,
    subscriber_id: Id,
    topic_id: Id,
) -> Result<Model, Error> {
    debug!("Creating subscription: subscriber_id={subscriber_id}, topic_id={topic_id}");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        subscriber_id: Set(subscriber_id),
        topic_id: Set(topic_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?.try_into_model()?)
}

/// Deletes the subscription of `subscriber_id` to `topic_id`, returning the
/// number of removed rows. Deleting an absent pair is not an error.
pub async fn delete(db: &DatabaseConnection, subscriber_id: Id, topic_id: Id) -> Result<u64, Error> {
    debug!("Deleting subscription: subscriber_id={subscriber_id}, topic_id={topic_id}");

    let result = Entity::delete_many()
        .filter(
            Condition::all()
                .add(Column::SubscriberId.eq(subscriber_id))
                .add(Column::TopicId.eq(topic_id)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

pub async fn find_by_topic_id(db: &DatabaseConnection, topic_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::TopicId.eq(topic_id))
        .all(db)
        .await?)
}

pub async fn find_by_subscriber_id(
    db: &DatabaseConnection,
    subscriber_id: Id,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::SubscriberId.eq(subscriber_id))
        .all(db)
        .await?)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn create_returns_a_new_subscription() -> Result<(), Error> {
        let now = chrono::Utc::now();
        let subscriber_id = Id::new_v4();
        let topic_id = Id::new_v4();

        let expected = Model {
            id: Id::new_v4(),
            subscriber_id,
            topic_id,
            created_at: now.into(),
            updated_at: now.into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![expected.clone()]])
            .into_connection();

        let subscription = create(&db, subscriber_id, topic_id).await?;

        assert_eq!(subscription.subscriber_id, subscriber_id);
        assert_eq!(subscription.topic_id, topic_id);

        Ok(())
    }

    #[tokio::test]
    async fn find_by_topic_id_returns_every_subscription() -> Result<(), Error> {
        let now = chrono::Utc::now();
        let topic_id = Id::new_v4();
        let rows: Vec<Model> = (0..3)
            .map(|_| Model {
                id: Id::new_v4(),
                subscriber_id: Id::new_v4(),
                topic_id,
                created_at: now.into(),
                updated_at: now.into(),
            })
            .collect();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![rows])
            .into_connection();

        let subscriptions = find_by_topic_id(&db, topic_id).await?;

        assert_eq!(subscriptions.len(), 3);
        assert!(subscriptions.iter().all(|s| s.topic_id == topic_id));

        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_removed_rows() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        assert_eq!(delete(&db, Id::new_v4(), Id::new_v4()).await?, 1);

        Ok(())
    }
}

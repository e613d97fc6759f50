use entity::topics::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, TryIntoModel};

use log::*;

use super::error::Error;

/// Creates a new topic. The domain must be unique.
///
/// # Errors
///
/// Returns `RecordAlreadyExists` when a topic with the same domain exists.
pub async fn create(
    db: &DatabaseConnection,
    domain: String,
    description: Option<String>,
) -> Result<Model, Error> {
    debug!("Creating topic with domain={domain}");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        domain: Set(domain),
        description: Set(description),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

pub async fn find_by_domain(db: &DatabaseConnection, domain: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Domain.eq(domain))
        .one(db)
        .await?)
}

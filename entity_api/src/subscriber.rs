use entity::subscribers::{ActiveModel, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ActiveValue::Set, DatabaseConnection, TryIntoModel};

use log::*;

use super::error::Error;

pub async fn create(db: &DatabaseConnection, name: String, email: String) -> Result<Model, Error> {
    debug!("Creating subscriber {email}");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        name: Set(name),
        email: Set(email),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

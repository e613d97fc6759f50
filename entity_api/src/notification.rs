use entity::notifications::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, Condition, DatabaseConnection, PaginatorTrait,
    QueryOrder, QuerySelect, TryIntoModel,
};

use log::*;

use super::error::Error;

pub async fn create(db: &DatabaseConnection, topic_id: Id, subject: String) -> Result<Model, Error> {
    debug!("Creating notification for topic_id={topic_id}");

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        topic_id: Set(topic_id),
        subject: Set(subject),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Fetches one page (1-based) of notifications published on any of
/// `topic_ids`, newest first, optionally restricted to `only_ids`.
/// Returns the page together with the total number of matching notifications.
/// A page past the end, including one whose offset does not fit in a `u64`,
/// is empty.
pub async fn find_page(
    db: &DatabaseConnection,
    topic_ids: Vec<Id>,
    only_ids: Option<Vec<Id>>,
    page: u64,
    limit: u64,
) -> Result<(Vec<Model>, u64), Error> {
    let mut condition = Condition::all().add(Column::TopicId.is_in(topic_ids));
    if let Some(ids) = only_ids {
        condition = condition.add(Column::Id.is_in(ids));
    }

    let query = Entity::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = query.clone().count(db).await?;
    let limit = limit.max(1);
    let offset = match page.saturating_sub(1).checked_mul(limit) {
        Some(offset) if offset < total => offset,
        _ => return Ok((Vec::new(), total)),
    };

    let notifications = query.offset(offset).limit(limit).all(db).await?;

    Ok((notifications, total))
}

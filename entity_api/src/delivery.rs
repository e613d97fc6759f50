//! Entity API for delivery records (the subscriber_notifications table).
//!
//! Every mutation here is monotone: a flag is only set on rows where it is
//! still `false`, so timestamps record the first transition and never move.

use entity::subscriber_notifications::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ActiveValue::Set, Condition, DatabaseConnection,
};

use log::*;

use super::error::Error;

/// Optional delivery-flag filters. `None` means "don't care".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryFilter {
    pub is_read: Option<bool>,
    pub is_sent: Option<bool>,
    pub is_deleted: Option<bool>,
}

impl DeliveryFilter {
    pub fn is_empty(&self) -> bool {
        self.is_read.is_none() && self.is_sent.is_none() && self.is_deleted.is_none()
    }

    pub fn matches(&self, record: &Model) -> bool {
        self.is_read.map_or(true, |v| record.is_read == v)
            && self.is_sent.map_or(true, |v| record.is_sent == v)
            && self.is_deleted.map_or(true, |v| record.is_deleted == v)
    }
}

/// Creates one PENDING/UNREAD/ACTIVE delivery record per subscriber.
pub async fn create_for_subscribers(
    db: &DatabaseConnection,
    notification_id: Id,
    subscriber_ids: &[Id],
) -> Result<(), Error> {
    if subscriber_ids.is_empty() {
        return Ok(());
    }

    debug!(
        "Creating {} delivery record(s) for notification_id={notification_id}",
        subscriber_ids.len()
    );

    let now = chrono::Utc::now();
    let records = subscriber_ids.iter().map(|subscriber_id| ActiveModel {
        id: Set(Id::new_v4()),
        subscriber_id: Set(*subscriber_id),
        notification_id: Set(notification_id),
        is_sent: Set(false),
        sent_at: Set(None),
        is_read: Set(false),
        read_at: Set(None),
        is_deleted: Set(false),
        deleted_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    });

    Entity::insert_many(records).exec(db).await?;

    Ok(())
}

/// Marks the records of `notification_id` as sent for the given subscribers only.
pub async fn mark_sent(
    db: &DatabaseConnection,
    notification_id: Id,
    subscriber_ids: &[Id],
) -> Result<u64, Error> {
    if subscriber_ids.is_empty() {
        return Ok(0);
    }

    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let result = Entity::update_many()
        .col_expr(Column::IsSent, Expr::value(true))
        .col_expr(Column::SentAt, Expr::value(now))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(
            Condition::all()
                .add(Column::NotificationId.eq(notification_id))
                .add(Column::SubscriberId.is_in(subscriber_ids.iter().copied()))
                .add(Column::IsSent.eq(false)),
        )
        .exec(db)
        .await?;

    debug!(
        "Marked {} delivery record(s) sent for notification_id={notification_id}",
        result.rows_affected
    );

    Ok(result.rows_affected)
}

/// Marks every delivery record of the given notifications as read.
pub async fn mark_read(db: &DatabaseConnection, notification_ids: &[Id]) -> Result<u64, Error> {
    if notification_ids.is_empty() {
        return Ok(0);
    }

    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let result = Entity::update_many()
        .col_expr(Column::IsRead, Expr::value(true))
        .col_expr(Column::ReadAt, Expr::value(now))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(
            Condition::all()
                .add(Column::NotificationId.is_in(notification_ids.iter().copied()))
                .add(Column::IsRead.eq(false)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Marks every delivery record of the given notifications as deleted.
pub async fn mark_deleted(db: &DatabaseConnection, notification_ids: &[Id]) -> Result<u64, Error> {
    if notification_ids.is_empty() {
        return Ok(0);
    }

    let now: DateTimeWithTimeZone = chrono::Utc::now().into();
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::DeletedAt, Expr::value(now))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(
            Condition::all()
                .add(Column::NotificationId.is_in(notification_ids.iter().copied()))
                .add(Column::IsDeleted.eq(false)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Delivery records of `subscriber_id` matching every flag set in `filter`.
pub async fn find_by_subscriber(
    db: &DatabaseConnection,
    subscriber_id: Id,
    filter: DeliveryFilter,
) -> Result<Vec<Model>, Error> {
    let mut condition = Condition::all().add(Column::SubscriberId.eq(subscriber_id));
    if let Some(is_read) = filter.is_read {
        condition = condition.add(Column::IsRead.eq(is_read));
    }
    if let Some(is_sent) = filter.is_sent {
        condition = condition.add(Column::IsSent.eq(is_sent));
    }
    if let Some(is_deleted) = filter.is_deleted {
        condition = condition.add(Column::IsDeleted.eq(is_deleted));
    }

    Ok(Entity::find().filter(condition).all(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(is_sent: bool, is_read: bool) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Id::new_v4(),
            subscriber_id: Id::new_v4(),
            notification_id: Id::new_v4(),
            is_sent,
            sent_at: None,
            is_read,
            read_at: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = DeliveryFilter::default();

        assert!(filter.is_empty());
        assert!(filter.matches(&record(true, false)));
        assert!(filter.matches(&record(false, true)));
    }

    #[test]
    fn filter_requires_every_present_flag() {
        let filter = DeliveryFilter {
            is_sent: Some(false),
            is_read: Some(false),
            ..Default::default()
        };

        assert!(filter.matches(&record(false, false)));
        assert!(!filter.matches(&record(true, false)));
        assert!(!filter.matches(&record(false, true)));
    }
}

//! `SeaORM` Entity for delivery records.
//!
//! One row per (subscriber, notification) pair. Each of the three flags only
//! ever moves from `false` to `true`, stamping its timestamp when it does.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = domain::subscriber_notifications::Model)]
#[sea_orm(schema_name = "notification_hub", table_name = "subscriber_notifications")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub subscriber_id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub notification_id: Id,
    pub is_sent: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub sent_at: Option<DateTimeWithTimeZone>,
    pub is_read: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub read_at: Option<DateTimeWithTimeZone>,
    pub is_deleted: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subscribers::Entity",
        from = "Column::SubscriberId",
        to = "super::subscribers::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Subscribers,
    #[sea_orm(
        belongs_to = "super::notifications::Entity",
        from = "Column::NotificationId",
        to = "super::notifications::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Notifications,
}

impl Related<super::subscribers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscribers.def()
    }
}

impl Related<super::notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = domain::subscribers::Model)]
#[sea_orm(schema_name = "notification_hub", table_name = "subscribers")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subscriber_topics::Entity")]
    SubscriberTopics,
    #[sea_orm(has_many = "super::subscriber_notifications::Entity")]
    SubscriberNotifications,
}

impl Related<super::subscriber_topics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriberTopics.def()
    }
}

impl Related<super::subscriber_notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriberNotifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

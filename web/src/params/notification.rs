use domain::notification::NotificationQuery;
use domain::{DeliveryFilter, Id};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateParams {
    #[schema(value_type = String, format = Uuid)]
    pub(crate) topic_id: Id,
    pub(crate) subject: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NotifyParams {
    #[schema(value_type = String, format = Uuid)]
    pub(crate) topic_id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub(crate) notification_id: Id,
}

/// Delivery-flag filters; an absent flag matches both values.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchOptions {
    pub(crate) is_read: Option<bool>,
    pub(crate) is_sent: Option<bool>,
    pub(crate) is_deleted: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SearchParams {
    #[serde(rename = "subId")]
    #[schema(value_type = String, format = Uuid)]
    pub(crate) sub_id: Id,
    pub(crate) page: Option<u64>,
    pub(crate) limit: Option<u64>,
    #[serde(default)]
    pub(crate) options: SearchOptions,
}

impl From<SearchParams> for NotificationQuery {
    fn from(params: SearchParams) -> Self {
        NotificationQuery {
            subscriber_id: params.sub_id,
            page: params.page,
            limit: params.limit,
            filter: DeliveryFilter {
                is_read: params.options.is_read,
                is_sent: params.options.is_sent,
                is_deleted: params.options.is_deleted,
            },
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarkAsReadParams {
    #[schema(value_type = Vec<String>)]
    pub(crate) notification_ids: Vec<Id>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct DeleteParams {
    #[schema(value_type = Vec<String>)]
    pub(crate) ids: Vec<Id>,
}

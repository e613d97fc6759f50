use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateParams {
    pub(crate) domain: String,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SubscriberParam {
    #[serde(rename = "subId")]
    #[schema(value_type = String, format = Uuid)]
    pub(crate) sub_id: Id,
}

/// Subscribe every listed subscriber to the topic named `domain`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SubscribeParams {
    pub(crate) domain: String,
    pub(crate) subscribers: Vec<SubscriberParam>,
}

impl SubscribeParams {
    pub(crate) fn subscriber_ids(&self) -> Vec<Id> {
        self.subscribers.iter().map(|s| s.sub_id).collect()
    }
}

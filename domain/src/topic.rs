use crate::error::{EntityErrorKind, Error};
use crate::store::SubscriptionStore;
use crate::topics::Model;
use log::*;

/// Creates the topic named `domain`. Domains are unique and must not be blank.
pub async fn create(
    store: &dyn SubscriptionStore,
    domain: String,
    description: Option<String>,
) -> Result<Model, Error> {
    let domain = domain.trim().to_owned();
    if domain.is_empty() {
        return Err(Error::entity(EntityErrorKind::Invalid));
    }

    let topic = store.create_topic(domain, description).await?;
    info!("Created topic {} ({})", topic.domain, topic.id);

    Ok(topic)
}

pub async fn find_by_domain(
    store: &dyn SubscriptionStore,
    domain: &str,
) -> Result<Option<Model>, Error> {
    store.find_topic_by_domain(domain).await
}

//! Topic-subscription reconciler.
//!
//! Applies batches of `(domain, [subscriber])` intents against the
//! [`SubscriptionStore`]. Intents in a batch and subscribers in an intent are
//! settled concurrently and every outcome is collected; one failure never
//! cancels its siblings.

use crate::error::{Error, NotificationErrorKind};
use crate::store::SubscriptionStore;
use crate::Id;
use events::TopicSubscriptionMessage;
use futures::future::join_all;
use log::*;
use service::config::ResubscribePolicy;
use std::collections::HashSet;
use std::sync::Arc;

/// Subscribe every listed subscriber to the topic named `domain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionIntent {
    pub domain: String,
    pub subscriber_ids: Vec<Id>,
}

impl From<TopicSubscriptionMessage> for SubscriptionIntent {
    fn from(message: TopicSubscriptionMessage) -> Self {
        Self {
            domain: message.domain,
            subscriber_ids: message.subscribers.into_iter().map(|s| s.sub_id).collect(),
        }
    }
}

#[derive(Debug)]
pub enum SubscriptionOutcome {
    Subscribed,
    /// The pair existed and was left in place.
    AlreadySubscribed,
    /// The pair existed and was removed.
    Unsubscribed,
    Failed(Error),
}

#[derive(Debug)]
pub struct SubscriberResult {
    pub subscriber_id: Id,
    pub outcome: SubscriptionOutcome,
}

/// Result of one intent. `results` is an error when the intent was abandoned
/// as a whole, e.g. because its topic does not exist.
#[derive(Debug)]
pub struct IntentReport {
    pub domain: String,
    pub results: Result<Vec<SubscriberResult>, Error>,
}

pub struct Reconciler {
    store: Arc<dyn SubscriptionStore>,
    policy: ResubscribePolicy,
}

impl Reconciler {
    pub fn new(store: Arc<dyn SubscriptionStore>, policy: ResubscribePolicy) -> Self {
        Self { store, policy }
    }

    /// Settles every intent and returns one report per intent, in input order.
    pub async fn reconcile(&self, intents: Vec<SubscriptionIntent>) -> Vec<IntentReport> {
        join_all(intents.into_iter().map(|intent| self.reconcile_intent(intent))).await
    }

    pub async fn reconcile_intent(&self, intent: SubscriptionIntent) -> IntentReport {
        let results = self.apply(&intent).await;
        match &results {
            Ok(results) => debug!(
                "Reconciled {} subscriber(s) for topic domain {}",
                results.len(),
                intent.domain
            ),
            Err(e) => error!("Abandoning subscription intent for {}: {e}", intent.domain),
        }

        IntentReport {
            domain: intent.domain,
            results,
        }
    }

    async fn apply(&self, intent: &SubscriptionIntent) -> Result<Vec<SubscriberResult>, Error> {
        let topic = self
            .store
            .find_topic_by_domain(&intent.domain)
            .await?
            .ok_or_else(|| Error::notification(NotificationErrorKind::TopicNotFound))?;
        let topic_id = topic.id;

        // A subscriber listed twice would otherwise race itself on the same pair.
        let mut seen = HashSet::new();
        let subscriber_ids = intent
            .subscriber_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id));

        let results = join_all(subscriber_ids.map(|subscriber_id| async move {
            SubscriberResult {
                subscriber_id,
                outcome: self.settle(topic_id, subscriber_id).await,
            }
        }))
        .await;

        Ok(results)
    }

    async fn settle(&self, topic_id: Id, subscriber_id: Id) -> SubscriptionOutcome {
        match self.subscribe(topic_id, subscriber_id).await {
            Ok(()) => SubscriptionOutcome::Subscribed,
            Err(e)
                if e.notification_kind() == Some(&NotificationErrorKind::AlreadySubscribed) =>
            {
                match self.policy {
                    ResubscribePolicy::Idempotent => SubscriptionOutcome::AlreadySubscribed,
                    ResubscribePolicy::Toggle => {
                        match self.unsubscribe(topic_id, subscriber_id).await {
                            Ok(()) => SubscriptionOutcome::Unsubscribed,
                            Err(e) => SubscriptionOutcome::Failed(e),
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Subscribing {subscriber_id} to topic {topic_id} failed: {e}");
                SubscriptionOutcome::Failed(e)
            }
        }
    }

    /// Inserts the `(subscriber_id, topic_id)` pair.
    ///
    /// Fails with `AlreadySubscribed` when the pair exists, including when a
    /// concurrent writer inserted it after the membership check, and with
    /// `SubscriberNotFound` for unknown subscribers.
    pub async fn subscribe(&self, topic_id: Id, subscriber_id: Id) -> Result<(), Error> {
        if self.store.find_subscriber(subscriber_id).await?.is_none() {
            return Err(Error::notification(NotificationErrorKind::SubscriberNotFound));
        }

        let members: HashSet<Id> = self
            .store
            .find_subscriptions_by_topic(topic_id)
            .await?
            .into_iter()
            .map(|s| s.subscriber_id)
            .collect();
        if members.contains(&subscriber_id) {
            return Err(Error::notification(NotificationErrorKind::AlreadySubscribed));
        }

        match self.store.create_subscription(subscriber_id, topic_id).await {
            Ok(_) => {
                info!("Subscribed {subscriber_id} to topic {topic_id}");
                Ok(())
            }
            Err(e) if e.is_duplicate() => Err(Error {
                source: Some(Box::new(e)),
                ..Error::notification(NotificationErrorKind::AlreadySubscribed)
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn unsubscribe(&self, topic_id: Id, subscriber_id: Id) -> Result<(), Error> {
        if self
            .store
            .delete_subscription(subscriber_id, topic_id)
            .await?
        {
            info!("Unsubscribed {subscriber_id} from topic {topic_id}");
        }
        Ok(())
    }
}

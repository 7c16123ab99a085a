//! GetSubscriptionHandler - Query handler for subscription state.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::ports::{SubscriptionReader, SubscriptionView};

/// Query for one subscription.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub subscription_id: SubscriptionId,
}

/// The subscription view, or `None` when it does not exist.
pub type GetSubscriptionResult = Option<SubscriptionView>;

/// Handler for the subscription query.
pub struct GetSubscriptionHandler {
    reader: Arc<dyn SubscriptionReader>,
}

impl GetSubscriptionHandler {
    /// Create a new handler with its dependencies.
    pub fn new(reader: Arc<dyn SubscriptionReader>) -> Self {
        Self { reader }
    }

    /// Fetch the subscription view.
    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<GetSubscriptionResult, DomainError> {
        self.reader.get_subscription(&query.subscription_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::foundation::{Address, CaveId, MemberId, Timestamp};
    use crate::domain::subscription::{Subscription, SubscriptionStatus, SubscriptionTier};
    use crate::ports::SubscriptionRepository;

    fn active_subscription() -> Subscription {
        let mut subscription = Subscription::create_incomplete(
            SubscriptionId::new(),
            MemberId::new(),
            CaveId::new(),
            SubscriptionTier::Prestige,
            Address::new("Claire Moreau", "12 rue des Lilas", None, "Lyon", "69003", "FR")
                .unwrap(),
            Some("cus_test".to_string()),
        );
        let start = Timestamp::now();
        subscription
            .activate(start, start.add_days(30), start, Some("sub_test".to_string()))
            .unwrap();
        subscription
    }

    #[tokio::test]
    async fn returns_the_subscription_view() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let subscription = active_subscription();
        store.save(&subscription).await.unwrap();
        let handler = GetSubscriptionHandler::new(store);

        let view = handler
            .handle(GetSubscriptionQuery {
                subscription_id: subscription.id,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.id, subscription.id);
        assert_eq!(view.status, SubscriptionStatus::Active);
        assert_eq!(view.bottles_per_cycle, 12);
    }

    #[tokio::test]
    async fn unknown_subscription_resolves_to_none() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let handler = GetSubscriptionHandler::new(store);

        let result = handler
            .handle(GetSubscriptionQuery {
                subscription_id: SubscriptionId::new(),
            })
            .await
            .unwrap();

        assert!(result.is_none());
    }
}

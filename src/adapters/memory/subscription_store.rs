//! In-Memory Subscription Store Adapter
//!
//! Keeps subscriptions in a process-local map and serves both the
//! repository (write) and reader (query) ports from it.
//! Useful for testing and development; production uses Postgres.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId};
use crate::domain::subscription::Subscription;
use crate::ports::{SubscriptionReader, SubscriptionRepository, SubscriptionView};

/// In-memory subscription storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: Arc<RwLock<HashMap<SubscriptionId, Subscription>>>,
}

impl InMemorySubscriptionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions (useful for tests).
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    /// Clear all subscriptions (useful for tests).
    pub async fn clear(&self) {
        self.subscriptions.write().await.clear();
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionStore {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;

        if subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Subscription {} already exists", subscription.id),
            ));
        }
        if let Some(billing_id) = &subscription.billing_subscription_id {
            let taken = subscriptions
                .values()
                .any(|s| s.billing_subscription_id.as_deref() == Some(billing_id.as_str()));
            if taken {
                return Err(DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("Billing subscription id {billing_id} already registered"),
                ));
            }
        }

        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;

        if !subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription {} not found", subscription.id),
            ));
        }

        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.get(id).cloned())
    }

    async fn find_by_billing_subscription_id(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .values()
            .find(|s| s.billing_subscription_id.as_deref() == Some(billing_subscription_id))
            .cloned())
    }
}

#[async_trait]
impl SubscriptionReader for InMemorySubscriptionStore {
    async fn get_subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<SubscriptionView>, DomainError> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.get(id).map(SubscriptionView::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Address, CaveId, MemberId, Timestamp};
    use crate::domain::subscription::{SubscriptionStatus, SubscriptionTier};

    fn test_address() -> Address {
        Address::new(
            "Claire Fontaine",
            "12 rue des Caves",
            None,
            "Lyon",
            "69002",
            "FR",
        )
        .unwrap()
    }

    fn test_subscription() -> Subscription {
        Subscription::create_incomplete(
            SubscriptionId::new(),
            MemberId::new(),
            CaveId::new(),
            SubscriptionTier::Decouverte,
            test_address(),
            Some("cus_test".to_string()),
        )
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let store = InMemorySubscriptionStore::new();
        let subscription = test_subscription();

        store.save(&subscription).await.unwrap();
        let found = store.find_by_id(&subscription.id).await.unwrap().unwrap();

        assert_eq!(found.id, subscription.id);
        assert_eq!(found.status, SubscriptionStatus::Incomplete);
    }

    #[tokio::test]
    async fn save_rejects_duplicate_id() {
        let store = InMemorySubscriptionStore::new();
        let subscription = test_subscription();

        store.save(&subscription).await.unwrap();
        let err = store.save(&subscription).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn update_requires_existing_subscription() {
        let store = InMemorySubscriptionStore::new();
        let subscription = test_subscription();

        let err = store.update(&subscription).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }

    #[tokio::test]
    async fn update_replaces_stored_state() {
        let store = InMemorySubscriptionStore::new();
        let mut subscription = test_subscription();
        store.save(&subscription).await.unwrap();

        let start = Timestamp::now();
        subscription
            .activate(start, start.add_days(30), start, Some("sub_42".to_string()))
            .unwrap();
        store.update(&subscription).await.unwrap();

        let found = store.find_by_id(&subscription.id).await.unwrap().unwrap();
        assert_eq!(found.status, SubscriptionStatus::Active);
        assert_eq!(found.billing_subscription_id.as_deref(), Some("sub_42"));
    }

    #[tokio::test]
    async fn find_by_billing_subscription_id_scans_stored_state() {
        let store = InMemorySubscriptionStore::new();
        let mut subscription = test_subscription();
        let start = Timestamp::now();
        subscription
            .activate(start, start.add_days(30), start, Some("sub_lookup".to_string()))
            .unwrap();
        store.save(&subscription).await.unwrap();

        let found = store
            .find_by_billing_subscription_id("sub_lookup")
            .await
            .unwrap();
        let missing = store
            .find_by_billing_subscription_id("sub_other")
            .await
            .unwrap();

        assert_eq!(found.map(|s| s.id), Some(subscription.id));
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn reader_view_computes_bottle_count() {
        let store = InMemorySubscriptionStore::new();
        let subscription = test_subscription();
        store.save(&subscription).await.unwrap();

        let view = store
            .get_subscription(&subscription.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.tier, SubscriptionTier::Decouverte);
        assert_eq!(view.bottles_per_cycle, 3);
    }
}

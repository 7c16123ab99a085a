//! Subscription repository port (write side).
//!
//! Defines the contract for persisting and retrieving Subscription
//! aggregates. Implementations handle the actual database operations.
//!
//! # Design
//!
//! - **Write-focused**: Optimized for aggregate persistence
//! - **Billing lookup**: Webhook processing resolves subscriptions by
//!   the billing processor's identifiers, not our own
//!
//! # Example
//!
//! ```ignore
//! async fn apply_paid_invoice(
//!     repo: &dyn SubscriptionRepository,
//!     invoice: &InvoiceObject,
//! ) -> Result<(), DomainError> {
//!     let billing_id = invoice.subscription.as_deref().unwrap_or_default();
//!     let mut subscription = repo
//!         .find_by_billing_subscription_id(billing_id)
//!         .await?
//!         .ok_or_else(|| {
//!             DomainError::new(ErrorCode::SubscriptionNotFound, "Unknown subscription")
//!         })?;
//!
//!     subscription.renew(period_start, period_end, Timestamp::now())?;
//!     repo.update(&subscription).await
//! }
//! ```

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::Subscription;
use async_trait::async_trait;

/// Repository port for Subscription aggregate persistence.
///
/// Handles write operations for the billing-driven lifecycle.
/// Implementations must ensure:
/// - Unique billing_subscription_id across subscriptions
/// - Whole-aggregate updates (status, period, flags in one write)
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Save a new subscription.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the billing subscription id is already taken
    /// - `DatabaseError` on persistence failure
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Update an existing subscription.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the subscription doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Find a subscription by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &SubscriptionId)
        -> Result<Option<Subscription>, DomainError>;

    /// Find a subscription by the billing processor's subscription id
    /// (sub_xxx).
    ///
    /// This is the primary webhook lookup: invoice and deletion events
    /// carry only the processor's identifier.
    async fn find_by_billing_subscription_id(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}

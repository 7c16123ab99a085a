//! RequestCancellationHandler - Command handler for end-of-period cancellation.
//!
//! Flags the subscription to stop renewing. The billing processor owns
//! the actual cancellation: the member turns off renewal in the billing
//! portal too, and the processor's deletion event is what finally closes
//! the subscription out. This flag keeps our side of the intent visible
//! to support tooling in the meantime.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::ports::SubscriptionRepository;

/// Command to stop a subscription from renewing.
#[derive(Debug, Clone)]
pub struct RequestCancellationCommand {
    pub subscription_id: SubscriptionId,
}

/// Result of a cancellation request.
#[derive(Debug, Clone)]
pub struct RequestCancellationResult {
    pub subscription_id: SubscriptionId,

    /// The subscription keeps shipping until this date, then ends.
    pub effective_at: Timestamp,
}

/// Handler for cancellation requests.
pub struct RequestCancellationHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl RequestCancellationHandler {
    /// Create a new handler with its dependencies.
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    /// Flag the subscription to end at the close of the current period.
    ///
    /// Idempotent: repeating the request leaves the flag set.
    pub async fn handle(
        &self,
        command: RequestCancellationCommand,
    ) -> Result<RequestCancellationResult, DomainError> {
        let mut subscription = self
            .subscriptions
            .find_by_id(&command.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found")
                    .with_detail("subscription_id", command.subscription_id.to_string())
            })?;

        subscription.request_cancellation()?;
        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            effective_at = %subscription.current_period_end.as_datetime(),
            "cancellation requested, subscription ends at period close"
        );

        Ok(RequestCancellationResult {
            subscription_id: subscription.id,
            effective_at: subscription.current_period_end,
        })
    }
}

//! ProcessWebhookHandler - Command handler for billing processor webhooks.
//!
//! The single write path of the platform: every subscription lifecycle
//! change and every shipment originates from a billing event landing
//! here. The pipeline is verify, dedupe, gate, apply, claim.
//!
//! Idempotency is claim-last: effects run first and the ledger row is
//! written only once they succeeded. A crash mid-pipeline leaves the
//! event unclaimed, the processor redelivers, and the retry re-runs
//! effects that are all idempotent (transitions re-resolve, the shipment
//! key dedupes allocation).

use std::sync::Arc;

use uuid::Uuid;

use crate::application::handlers::fulfillment::{CreateShipmentCommand, CreateShipmentHandler};
use crate::domain::billing::{
    BillingEvent, BillingEventKind, CheckoutObject, InvoiceObject, SubscriptionObject,
    WebhookError, WebhookVerifier,
};
use crate::domain::foundation::{ShipmentId, SubscriptionId, Timestamp};
use crate::domain::subscription::{resolve, Subscription};
use crate::ports::{BillingEventLedger, BillingEventRecord, ClaimResult, SubscriptionRepository};

/// Command carrying one webhook delivery, exactly as received.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body; the signature covers these exact bytes.
    pub payload: Vec<u8>,

    /// Value of the signature header.
    pub signature: String,
}

/// Result of processing one webhook delivery.
///
/// Every variant is acknowledged with 200 so the processor stops
/// redelivering; only a `WebhookError` makes it retry.
#[derive(Debug, Clone)]
pub enum ProcessWebhookResult {
    /// First payment confirmed; the subscription is now active.
    SubscriptionActivated {
        event_id: String,
        subscription_id: SubscriptionId,
    },

    /// Invoice paid; the period advanced and fulfillment ran.
    PeriodRenewed {
        event_id: String,
        subscription_id: SubscriptionId,
        shipment_id: ShipmentId,
        /// False when the period already had its shipment.
        shipment_created: bool,
    },

    /// Renewal payment failed; the subscription is past due.
    MarkedPastDue {
        event_id: String,
        subscription_id: SubscriptionId,
    },

    /// The processor deleted the subscription; it is closed out.
    SubscriptionClosed {
        event_id: String,
        subscription_id: SubscriptionId,
    },

    /// Recorded but deliberately not applied: unmodeled event type, or a
    /// test-mode event in a livemode-only deployment.
    Ignored { event_id: String, reason: String },

    /// The lifecycle table has no transition from the subscription's
    /// current status; recorded as a no-op.
    Skipped { event_id: String, reason: String },

    /// This event id was already processed; nothing ran.
    Duplicate { event_id: String },
}

impl ProcessWebhookResult {
    /// The processor's event id this result belongs to.
    pub fn event_id(&self) -> &str {
        match self {
            Self::SubscriptionActivated { event_id, .. }
            | Self::PeriodRenewed { event_id, .. }
            | Self::MarkedPastDue { event_id, .. }
            | Self::SubscriptionClosed { event_id, .. }
            | Self::Ignored { event_id, .. }
            | Self::Skipped { event_id, .. }
            | Self::Duplicate { event_id } => event_id,
        }
    }
}

/// Handler for billing webhook deliveries.
pub struct ProcessWebhookHandler {
    verifier: WebhookVerifier,
    ledger: Arc<dyn BillingEventLedger>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    create_shipment: Arc<CreateShipmentHandler>,
    require_livemode: bool,
}

impl ProcessWebhookHandler {
    /// Create a new handler with its dependencies.
    pub fn new(
        verifier: WebhookVerifier,
        ledger: Arc<dyn BillingEventLedger>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        create_shipment: Arc<CreateShipmentHandler>,
        require_livemode: bool,
    ) -> Self {
        Self {
            verifier,
            ledger,
            subscriptions,
            create_shipment,
            require_livemode,
        }
    }

    /// Process one webhook delivery end to end.
    pub async fn handle(
        &self,
        command: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        // 1. Verify the signature before trusting anything in the payload
        let event = self
            .verifier
            .verify_and_parse(&command.payload, &command.signature)?;

        // 2. Drop replayed deliveries without re-running effects
        let existing = self
            .ledger
            .find_by_event_id(&event.id)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?;
        if let Some(record) = existing {
            tracing::info!(
                event_id = %event.id,
                outcome = ?record.outcome,
                "duplicate webhook delivery acknowledged"
            );
            return Ok(ProcessWebhookResult::Duplicate { event_id: event.id });
        }

        // 3. In enforcing deployments only livemode events change state
        if self.require_livemode && !event.is_live() {
            return self
                .acknowledge_ignored(&event, "test-mode event in a livemode-only deployment")
                .await;
        }

        // 4. Dispatch by event kind
        match event.kind() {
            BillingEventKind::CheckoutCompleted => self.apply_checkout_completed(&event).await,
            BillingEventKind::InvoicePaid => self.apply_invoice_paid(&event).await,
            BillingEventKind::InvoicePaymentFailed => self.apply_payment_failed(&event).await,
            BillingEventKind::SubscriptionDeleted => self.apply_subscription_deleted(&event).await,
            BillingEventKind::Unknown => {
                self.acknowledge_ignored(&event, "event type is not modeled")
                    .await
            }
        }
    }

    /// `checkout.session.completed` - first payment confirmed.
    ///
    /// The checkout carries our subscription id in its metadata; the
    /// processor's subscription id travels the other way and is stored
    /// for the invoice events that follow.
    async fn apply_checkout_completed(
        &self,
        event: &BillingEvent,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let checkout: CheckoutObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::MalformedPayload(format!("checkout object: {}", e)))?;

        let platform_id = checkout
            .platform_subscription_id()
            .ok_or(WebhookError::MissingField("metadata.subscription_id"))?;
        let subscription_id = platform_id
            .parse::<Uuid>()
            .map(SubscriptionId::from_uuid)
            .map_err(|_| {
                WebhookError::MalformedPayload(format!(
                    "metadata.subscription_id '{}' is not a UUID",
                    platform_id
                ))
            })?;

        let mut subscription = self.find_subscription(&subscription_id).await?;

        if resolve(subscription.status, BillingEventKind::CheckoutCompleted).is_none() {
            return self
                .acknowledge_skipped(
                    event,
                    format!(
                        "no transition from {:?} on checkout completion",
                        subscription.status
                    ),
                )
                .await;
        }

        // The first invoice reports the exact period bounds; until it
        // lands the period is provisionally one month from the payment
        let paid_at = event_timestamp(event)?;
        subscription
            .activate(
                paid_at,
                paid_at.add_days(30),
                paid_at,
                checkout.subscription.clone(),
            )
            .map_err(|e| WebhookError::InvalidTransition(e.to_string()))?;
        self.update_subscription(&subscription).await?;

        self.claim(BillingEventRecord::applied(
            &event.id,
            &event.event_type,
            event_payload(event),
        ))
        .await?;

        tracing::info!(
            event_id = %event.id,
            subscription_id = %subscription.id,
            "subscription activated"
        );
        Ok(ProcessWebhookResult::SubscriptionActivated {
            event_id: event.id.clone(),
            subscription_id: subscription.id,
        })
    }

    /// `invoice.paid` - an invoice settled; advance the period and ship.
    async fn apply_invoice_paid(
        &self,
        event: &BillingEvent,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let invoice: InvoiceObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::MalformedPayload(format!("invoice object: {}", e)))?;
        let billing_subscription_id = invoice
            .subscription
            .clone()
            .ok_or(WebhookError::MissingField("subscription"))?;

        let mut subscription = self.find_by_processor_id(&billing_subscription_id).await?;

        if resolve(subscription.status, BillingEventKind::InvoicePaid).is_none() {
            return self
                .acknowledge_skipped(
                    event,
                    format!(
                        "no transition from {:?} on a paid invoice",
                        subscription.status
                    ),
                )
                .await;
        }

        // Advance the period to the exact bounds the invoice reports
        let period_start = Timestamp::from_unix_secs(invoice.period_start).ok_or_else(|| {
            WebhookError::MalformedPayload("period_start out of range".to_string())
        })?;
        let period_end = Timestamp::from_unix_secs(invoice.period_end)
            .ok_or_else(|| WebhookError::MalformedPayload("period_end out of range".to_string()))?;
        let paid_at = event_timestamp(event)?;

        subscription
            .renew(period_start, period_end, paid_at)
            .map_err(|e| WebhookError::InvalidTransition(e.to_string()))?;
        self.update_subscription(&subscription).await?;

        // Fulfillment must succeed before the event is claimed; failing
        // here leaves the event unclaimed so the processor redelivers
        let fulfillment = self
            .create_shipment
            .handle(CreateShipmentCommand {
                subscription_id: subscription.id,
                carrier: None,
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    event_id = %event.id,
                    subscription_id = %subscription.id,
                    error = %e,
                    "fulfillment failed, leaving event unclaimed for redelivery"
                );
                WebhookError::FulfillmentFailed(e.to_string())
            })?;

        self.claim(BillingEventRecord::applied(
            &event.id,
            &event.event_type,
            event_payload(event),
        ))
        .await?;

        tracing::info!(
            event_id = %event.id,
            subscription_id = %subscription.id,
            shipment_id = %fulfillment.shipment.id,
            shipment_created = fulfillment.created,
            "billing period renewed and fulfilled"
        );
        Ok(ProcessWebhookResult::PeriodRenewed {
            event_id: event.id.clone(),
            subscription_id: subscription.id,
            shipment_id: fulfillment.shipment.id,
            shipment_created: fulfillment.created,
        })
    }

    /// `invoice.payment_failed` - a renewal charge bounced.
    ///
    /// Only the first failure moves the subscription to past due; the
    /// processor's later retry failures resolve to no transition and are
    /// recorded as skipped.
    async fn apply_payment_failed(
        &self,
        event: &BillingEvent,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let invoice: InvoiceObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::MalformedPayload(format!("invoice object: {}", e)))?;
        let billing_subscription_id = invoice
            .subscription
            .clone()
            .ok_or(WebhookError::MissingField("subscription"))?;

        let mut subscription = self.find_by_processor_id(&billing_subscription_id).await?;

        if resolve(subscription.status, BillingEventKind::InvoicePaymentFailed).is_none() {
            return self
                .acknowledge_skipped(
                    event,
                    format!(
                        "no transition from {:?} on a failed payment",
                        subscription.status
                    ),
                )
                .await;
        }

        subscription
            .mark_past_due()
            .map_err(|e| WebhookError::InvalidTransition(e.to_string()))?;
        self.update_subscription(&subscription).await?;

        self.claim(BillingEventRecord::applied(
            &event.id,
            &event.event_type,
            event_payload(event),
        ))
        .await?;

        tracing::warn!(
            event_id = %event.id,
            subscription_id = %subscription.id,
            "renewal payment failed, subscription past due"
        );
        Ok(ProcessWebhookResult::MarkedPastDue {
            event_id: event.id.clone(),
            subscription_id: subscription.id,
        })
    }

    /// `customer.subscription.deleted` - the processor ended the
    /// subscription, either after exhausted payment retries or a
    /// member-requested cancellation taking effect.
    async fn apply_subscription_deleted(
        &self,
        event: &BillingEvent,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let object: SubscriptionObject = event
            .deserialize_object()
            .map_err(|e| WebhookError::MalformedPayload(format!("subscription object: {}", e)))?;

        let mut subscription = self.find_by_processor_id(&object.id).await?;

        if resolve(subscription.status, BillingEventKind::SubscriptionDeleted).is_none() {
            return self
                .acknowledge_skipped(
                    event,
                    format!("no transition from {:?} on deletion", subscription.status),
                )
                .await;
        }

        let ended_at = event_timestamp(event)?;
        subscription
            .close_out(ended_at)
            .map_err(|e| WebhookError::InvalidTransition(e.to_string()))?;
        self.update_subscription(&subscription).await?;

        self.claim(BillingEventRecord::applied(
            &event.id,
            &event.event_type,
            event_payload(event),
        ))
        .await?;

        tracing::info!(
            event_id = %event.id,
            subscription_id = %subscription.id,
            "subscription closed out"
        );
        Ok(ProcessWebhookResult::SubscriptionClosed {
            event_id: event.id.clone(),
            subscription_id: subscription.id,
        })
    }

    // ════════════════════════════════════════════════════════════════
    // Shared plumbing
    // ════════════════════════════════════════════════════════════════

    async fn find_subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<Subscription, WebhookError> {
        self.subscriptions
            .find_by_id(id)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(id.to_string()))
    }

    async fn find_by_processor_id(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Subscription, WebhookError> {
        self.subscriptions
            .find_by_billing_subscription_id(billing_subscription_id)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(billing_subscription_id.to_string()))
    }

    async fn update_subscription(&self, subscription: &Subscription) -> Result<(), WebhookError> {
        self.subscriptions
            .update(subscription)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))
    }

    async fn acknowledge_ignored(
        &self,
        event: &BillingEvent,
        reason: &str,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        self.claim(BillingEventRecord::ignored(
            &event.id,
            &event.event_type,
            reason,
            event_payload(event),
        ))
        .await?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            reason,
            "billing event ignored"
        );
        Ok(ProcessWebhookResult::Ignored {
            event_id: event.id.clone(),
            reason: reason.to_string(),
        })
    }

    async fn acknowledge_skipped(
        &self,
        event: &BillingEvent,
        reason: String,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        self.claim(BillingEventRecord::skipped(
            &event.id,
            &event.event_type,
            reason.clone(),
            event_payload(event),
        ))
        .await?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            %reason,
            "billing event skipped"
        );
        Ok(ProcessWebhookResult::Skipped {
            event_id: event.id.clone(),
            reason,
        })
    }

    /// Write the ledger row. Losing the claim race to a concurrent
    /// delivery of the same event is not an error: effects are
    /// idempotent and the winner's row stands.
    async fn claim(&self, record: BillingEventRecord) -> Result<(), WebhookError> {
        let event_id = record.event_id.clone();
        match self.ledger.record(record).await {
            Ok(ClaimResult::Claimed) => Ok(()),
            Ok(ClaimResult::Duplicate) => {
                tracing::info!(
                    event_id = %event_id,
                    "concurrent delivery already claimed this event"
                );
                Ok(())
            }
            Err(e) => Err(WebhookError::Database(e.to_string())),
        }
    }
}

/// The event's own creation timestamp.
fn event_timestamp(event: &BillingEvent) -> Result<Timestamp, WebhookError> {
    Timestamp::from_unix_secs(event.created)
        .ok_or_else(|| WebhookError::MalformedPayload("created timestamp out of range".to_string()))
}

/// Full event payload stored on the ledger row for audit.
fn event_payload(event: &BillingEvent) -> serde_json::Value {
    serde_json::to_value(event).unwrap_or(serde_json::Value::Null)
}

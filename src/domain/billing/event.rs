//! Billing processor webhook event types.
//!
//! Defines the structures for parsing billing webhook payloads.
//! Only fields relevant to fulfillment processing are captured; the
//! processor's full event schema is treated as opaque JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Billing webhook event envelope.
///
/// Contains the essential fields needed for webhook processing.
/// Additional fields from the processor's event schema are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "invoice.paid").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: BillingEventData,

    /// Whether this is a live mode event (vs test mode).
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl BillingEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Parse the event type into a known enum variant.
    pub fn kind(&self) -> BillingEventKind {
        BillingEventKind::from_str(&self.event_type)
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Known billing event types that drive the subscription lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingEventKind {
    /// Checkout completed: the member's first payment went through.
    CheckoutCompleted,
    /// Recurring invoice paid: a billing cycle renewed.
    InvoicePaid,
    /// Recurring invoice payment failed.
    InvoicePaymentFailed,
    /// The processor-side subscription ended.
    SubscriptionDeleted,
    /// Unknown or unhandled event type.
    Unknown,
}

impl BillingEventKind {
    /// Parse event kind from the processor's type string.
    ///
    /// `invoice.payment_succeeded` is accepted as an alias for
    /// `invoice.paid`; processors emit one or the other depending on
    /// configuration.
    pub fn from_str(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutCompleted,
            "invoice.paid" | "invoice.payment_succeeded" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Unknown,
        }
    }

    /// Convert to the canonical event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutCompleted => "checkout.session.completed",
            Self::InvoicePaid => "invoice.paid",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::Unknown => "unknown",
        }
    }

    /// The event kinds that appear in the lifecycle transition table.
    pub const MODELED: [BillingEventKind; 4] = [
        Self::CheckoutCompleted,
        Self::InvoicePaid,
        Self::InvoicePaymentFailed,
        Self::SubscriptionDeleted,
    ];
}

/// Checkout session payload (`checkout.session.completed`).
///
/// Carries the link between the processor's new subscription and the
/// platform's pending one: the platform writes its local subscription id
/// into checkout metadata when the session is created.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutObject {
    /// Processor-side checkout session id (cs_xxx).
    pub id: String,

    /// Processor-side subscription id created by this checkout (sub_xxx).
    pub subscription: Option<String>,

    /// Processor-side customer id (cus_xxx).
    pub customer: Option<String>,

    /// Metadata echoed back from session creation.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutObject {
    /// The platform subscription id stashed in checkout metadata.
    pub fn platform_subscription_id(&self) -> Option<&str> {
        self.metadata.get("subscription_id").map(String::as_str)
    }
}

/// Invoice payload (`invoice.paid`, `invoice.payment_failed`).
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    /// Processor-side invoice id (in_xxx).
    pub id: String,

    /// Processor-side subscription id this invoice bills (sub_xxx).
    pub subscription: Option<String>,

    /// Start of the billing period the invoice covers (Unix timestamp).
    pub period_start: i64,

    /// End of the billing period the invoice covers (Unix timestamp).
    pub period_end: i64,
}

/// Subscription payload (`customer.subscription.deleted`).
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    /// Processor-side subscription id (sub_xxx).
    pub id: String,

    /// Processor-side status at the time of the event.
    pub status: Option<String>,
}

/// Builder for creating test BillingEvent instances.
#[cfg(test)]
pub struct BillingEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for BillingEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "invoice.paid".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl BillingEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> BillingEvent {
        BillingEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: BillingEventData { object: self.object },
            livemode: self.livemode,
        }
    }
}

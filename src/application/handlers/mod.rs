//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations, grouped
//! by the aggregate they drive.

pub mod billing;
pub mod fulfillment;
pub mod subscription;

pub use billing::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
pub use fulfillment::{
    CreateShipmentCommand, CreateShipmentHandler, CreateShipmentResult, FulfillmentPolicy,
    GenerateLabelCommand, GenerateLabelHandler, GenerateLabelResult, GetTrackingHandler,
    GetTrackingQuery, GetTrackingResult, ListShipmentsHandler, ListShipmentsQuery,
    ListShipmentsResult, RefreshTrackingCommand, RefreshTrackingHandler, RefreshTrackingResult,
};
pub use subscription::{
    GetSubscriptionHandler, GetSubscriptionQuery, GetSubscriptionResult,
    RequestCancellationCommand, RequestCancellationHandler, RequestCancellationResult,
};

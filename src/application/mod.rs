//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::{
    // Billing handlers
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult,
    // Fulfillment handlers
    CreateShipmentCommand, CreateShipmentHandler, CreateShipmentResult, FulfillmentPolicy,
    GenerateLabelCommand, GenerateLabelHandler, GenerateLabelResult,
    RefreshTrackingCommand, RefreshTrackingHandler, RefreshTrackingResult,
    GetTrackingHandler, GetTrackingQuery, GetTrackingResult,
    ListShipmentsHandler, ListShipmentsQuery, ListShipmentsResult,
    // Subscription handlers
    RequestCancellationCommand, RequestCancellationHandler, RequestCancellationResult,
    GetSubscriptionHandler, GetSubscriptionQuery, GetSubscriptionResult,
};

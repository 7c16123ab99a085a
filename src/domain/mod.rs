//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `billing` - Billing processor events and webhook verification
//! - `subscription` - Subscription lifecycle driven by billing events
//! - `fulfillment` - Wine allocation, shipments, and carrier tracking

pub mod billing;
pub mod foundation;
pub mod fulfillment;
pub mod subscription;

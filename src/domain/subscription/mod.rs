//! Subscription domain module.
//!
//! Handles the billing-driven subscription lifecycle for wine club members.
//!
//! # Module Structure
//!
//! - `aggregate` - Subscription aggregate entity
//! - `status` - SubscriptionStatus state machine
//! - `tier` - SubscriptionTier box sizes
//! - `transitions` - Billing event to status transition table

mod aggregate;
mod status;
mod tier;
mod transitions;

pub use aggregate::Subscription;
pub use status::SubscriptionStatus;
pub use tier::SubscriptionTier;
pub use transitions::{resolve, TransitionEffect, TransitionRule, LIFECYCLE_TABLE};

//! In-memory adapters for testing and development.
//!
//! Each adapter implements the same port contract as its Postgres
//! counterpart, with extra helpers for seeding and assertions.

pub mod billing_ledger;
pub mod fulfillment_store;
pub mod subscription_store;

pub use billing_ledger::InMemoryBillingLedger;
pub use fulfillment_store::InMemoryFulfillmentStore;
pub use subscription_store::InMemorySubscriptionStore;

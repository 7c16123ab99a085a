//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `carriers` - Parcel carrier HTTP clients (Colissimo, UPS) and a test mock
//! - `http` - REST API exposure via axum
//! - `memory` - In-memory stores for tests and local development
//! - `postgres` - PostgreSQL persistence via sqlx

pub mod carriers;
pub mod http;
pub mod memory;
pub mod postgres;

pub use carriers::{build_registry, MockCarrier};
pub use http::{BillingAppState, FulfillmentAppState, SubscriptionAppState};
pub use memory::{InMemoryBillingLedger, InMemoryFulfillmentStore, InMemorySubscriptionStore};
pub use postgres::{
    run_migrations, PostgresBillingEventLedger, PostgresFulfillmentStore, PostgresShipmentReader,
    PostgresSubscriptionReader, PostgresSubscriptionRepository,
};

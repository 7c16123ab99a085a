//! PostgreSQL adapters - Database implementations of the persistence ports.
//!
//! - `PostgresSubscriptionRepository` / `PostgresSubscriptionReader` - Subscription aggregate and views
//! - `PostgresFulfillmentStore` - Shipments, stock allocation, tracking snapshots
//! - `PostgresShipmentReader` - Shipment listings for the dashboard
//! - `PostgresBillingEventLedger` - Processed billing event claims

mod billing_ledger;
mod fulfillment_store;
mod shipment_reader;
mod subscription_reader;
mod subscription_repository;

pub use billing_ledger::PostgresBillingEventLedger;
pub use fulfillment_store::PostgresFulfillmentStore;
pub use shipment_reader::PostgresShipmentReader;
pub use subscription_reader::PostgresSubscriptionReader;
pub use subscription_repository::PostgresSubscriptionRepository;

use crate::config::DatabaseConfig;

/// Open a Postgres connection pool tuned from the database configuration.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<sqlx::PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(&config.url)
        .await
}

/// Run pending database migrations from the bundled `migrations/` directory.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

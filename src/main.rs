//! VineCellar server entry point.
//!
//! Loads configuration, connects to Postgres, wires the billing webhook
//! pipeline and fulfillment/subscription APIs, and serves them over HTTP.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use secrecy::SecretString;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vinecellar::adapters::carriers::build_registry;
use vinecellar::adapters::http::{
    billing_router, fulfillment_router, health_routes, subscription_router, BillingAppState,
    FulfillmentAppState, SubscriptionAppState,
};
use vinecellar::adapters::postgres::{
    connect_pool, run_migrations, PostgresBillingEventLedger, PostgresFulfillmentStore,
    PostgresShipmentReader, PostgresSubscriptionReader, PostgresSubscriptionRepository,
};
use vinecellar::application::FulfillmentPolicy;
use vinecellar::config::AppConfig;
use vinecellar::ports::{
    BillingEventLedger, FulfillmentStore, ShipmentReader, SubscriptionReader,
    SubscriptionRepository,
};

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    init_tracing(&config);

    tracing::info!(
        environment = ?config.server.environment,
        "starting vinecellar fulfillment orchestrator"
    );

    let pool = connect_pool(&config.database)
        .await
        .expect("Failed to connect to Postgres");

    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");
        tracing::info!("database migrations applied");
    }

    let carriers = Arc::new(build_registry(&config.carriers));
    let warehouse = config
        .fulfillment
        .warehouse
        .to_address()
        .expect("Invalid warehouse address");
    let policy = FulfillmentPolicy {
        default_carrier: config.fulfillment.default_carrier.clone(),
        allocation_order: config.fulfillment.allocation_order,
        service_level: config.fulfillment.service_level,
        warehouse,
    };

    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(PostgresSubscriptionRepository::new(pool.clone()));
    let subscription_reader: Arc<dyn SubscriptionReader> =
        Arc::new(PostgresSubscriptionReader::new(pool.clone()));
    let fulfillment_store: Arc<dyn FulfillmentStore> =
        Arc::new(PostgresFulfillmentStore::new(pool.clone()));
    let shipment_reader: Arc<dyn ShipmentReader> =
        Arc::new(PostgresShipmentReader::new(pool.clone()));
    let ledger: Arc<dyn BillingEventLedger> = Arc::new(PostgresBillingEventLedger::new(pool));

    let billing_state = BillingAppState {
        webhook_secret: SecretString::new(config.billing.webhook_secret.clone()),
        require_livemode: config.billing.require_livemode,
        ledger,
        subscriptions: subscriptions.clone(),
        fulfillment_store: fulfillment_store.clone(),
        carriers: carriers.clone(),
        policy: policy.clone(),
    };

    let fulfillment_state = FulfillmentAppState {
        subscriptions: subscriptions.clone(),
        fulfillment_store,
        shipment_reader,
        carriers,
        policy,
    };

    let subscription_state = SubscriptionAppState {
        subscription_reader,
        subscriptions,
    };

    let mut app = Router::new()
        .merge(health_routes())
        .merge(billing_router().with_state(billing_state))
        .merge(fulfillment_router().with_state(fulfillment_state))
        .merge(subscription_router().with_state(subscription_state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let cors_origins = config.server.cors_origins_list();
    if !cors_origins.is_empty() {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|origin| origin.parse::<HeaderValue>().ok())
            .collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        );
    }

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!(%addr, "vinecellar listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "vinecellar={},tower_http=info,sqlx=warn",
            config.server.log_level
        ))
    });

    if config.server.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

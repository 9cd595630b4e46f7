//! Booking service entry point.

use booking_cms::CmsCatalog;
use booking_gateway::{GatewayConfig, HostedCheckoutClient, WebhookVerifier};
use booking_orders::OrdersClient;
use booking_postgres::PostgresLedger;
use booking_web::{build_router, AppState, Config};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_web=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting booking service");

    let config = Arc::new(Config::from_env());
    info!(
        bind = %config.bind_addr(),
        cms = %config.cms.base_url,
        orders = %config.orders.rest_url,
        payments_enabled = config.payments.enabled,
        "Configuration loaded"
    );

    info!("Connecting to reservation database...");
    let ledger = PostgresLedger::connect(&config.database.url, config.database.max_connections)
        .await
        .map_err(|e| format!("database connection failed: {e}"))?;
    ledger
        .ensure_schema()
        .await
        .map_err(|e| format!("schema setup failed: {e}"))?;
    info!("Reservation database ready");

    let catalog = Arc::new(CmsCatalog::new(config.cms.base_url.clone()));
    let orders = Arc::new(OrdersClient::new(
        config.orders.rest_url.clone(),
        config.orders.consumer_key.clone(),
        config.orders.consumer_secret.clone(),
    ));

    let serving_hostname = config
        .server
        .public_base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split([':', '/'])
        .next()
        .unwrap_or("");
    let gateway = match GatewayConfig::from_env(serving_hostname) {
        Ok(gateway_config) => {
            info!(environment = %gateway_config.environment, "Payment gateway configured");
            Some(HostedCheckoutClient::new(gateway_config))
        }
        Err(error) => {
            warn!(%error, "payment gateway not configured, checkout disabled");
            None
        }
    };

    let mut verifier = WebhookVerifier::new();
    if let (Some(key_id), Some(secret)) = (
        config.payments.webhook_key_id.clone(),
        config.payments.webhook_secret.clone(),
    ) {
        verifier = verifier.with_key(key_id, secret);
    } else {
        warn!("no webhook signing key configured, all webhooks will be rejected");
    }

    let state = AppState::new(
        catalog,
        Arc::new(ledger),
        gateway,
        verifier,
        orders,
        Arc::clone(&config),
    );

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}

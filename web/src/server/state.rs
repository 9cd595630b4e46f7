//! Application state shared across HTTP handlers.

use crate::config::Config;
use booking_core::catalog::ItemCatalog;
use booking_core::ledger::ReservationLedger;
use booking_core::{AvailabilityService, LifecycleManager};
use booking_gateway::{HostedCheckoutClient, WebhookVerifier};
use booking_orders::OrdersClient;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request. All gateway/client instances
/// are constructed once at startup and injected; handlers never read the
/// process environment.
#[derive(Clone)]
pub struct AppState {
    /// Availability query service.
    pub availability: AvailabilityService,
    /// Order lifecycle to ledger bridge.
    pub lifecycle: LifecycleManager,
    /// Hosted checkout client. `None` when gateway credentials are absent;
    /// checkout then answers 503 while the rest of the API keeps serving.
    pub gateway: Option<HostedCheckoutClient>,
    /// Webhook signature verifier.
    pub verifier: WebhookVerifier,
    /// Order backend client.
    pub orders: Arc<OrdersClient>,
    /// Application configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates the application state.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn ItemCatalog>,
        ledger: Arc<dyn ReservationLedger>,
        gateway: Option<HostedCheckoutClient>,
        verifier: WebhookVerifier,
        orders: Arc<OrdersClient>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            availability: AvailabilityService::new(catalog, Arc::clone(&ledger)),
            lifecycle: LifecycleManager::new(ledger),
            gateway,
            verifier,
            orders,
            config,
        }
    }
}

//! Booking HTTP service.
//!
//! Wires the availability calculator, reservation ledger, payment gateway
//! adapter and the CMS/order-backend clients behind an Axum router:
//!
//! - `GET /api/availability`: weekly availability for one item.
//! - `POST /api/checkout`: pending order plus hosted payment session.
//! - `POST /api/webhooks/payment`: signed provider events.
//! - `POST /api/orders/events`: order status transitions from the backend.
//! - `POST /api/orders/cleanup`: token-guarded stale order purge.
//! - `GET /health`: liveness.

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::Config;
pub use error::AppError;
pub use server::{build_router, AppState};

//! HTTP API handlers.

pub mod availability;
pub mod checkout;
pub mod orders;
pub mod webhooks;

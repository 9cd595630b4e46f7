//! Hosted-payment-provider adapter.
//!
//! Everything the booking service needs from the payment provider:
//!
//! - **Environment resolution**: a pure, deterministic function from
//!   explicit override, configuration and serving hostname to production or
//!   preprod, with credentials scoped per environment.
//! - **Hosted checkout sessions**: one HTTP call creating a payment page and
//!   returning its redirect URL and session id.
//! - **Webhook verification**: HMAC-SHA256 over the raw body, checked before
//!   anything downstream sees the event.
//! - **Merchant references**: the `wc_<order id>` encoding that ties a
//!   provider event back to an order.

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod reference;
pub mod webhook;

pub use client::{HostedCheckoutClient, HostedSession, SessionRequest};
pub use config::{resolve_environment, Environment, GatewayConfig};
pub use error::GatewayError;
pub use event::WebhookEvent;
pub use reference::{format_reference, parse_reference};
pub use webhook::{WebhookVerifier, KEY_ID_HEADER, SIGNATURE_HEADER};

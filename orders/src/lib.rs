//! Commerce order backend client.
//!
//! A thin REST client (basic auth) plus the typed order shapes the booking
//! service reads and writes: schedule metadata accessors, lifecycle event
//! construction and the stale-order purge.

pub mod cleanup;
pub mod client;
pub mod error;
pub mod types;

pub use cleanup::{purge_stale, CleanupFailure, CleanupOutcome, DEFAULT_STATUSES};
pub use client::OrdersClient;
pub use error::OrdersError;
pub use types::{
    Billing, MetaDatum, NewOrder, Order, OrderLineItem, OrderUpdate, META_ITEM_TYPE,
    META_PAYMENT_PROVIDER, META_SCHEDULED_DATE, META_SERVICE_SLUG, META_SUBSCRIPTION_SLUG,
    META_TIME_SLOT, PROVIDER_TAG,
};

//! Payment provider status mapping.
//!
//! Providers report payment state in a handful of spellings; the mapping
//! below normalizes them into an [`OrderStatus`] whose bucket drives the
//! ledger. The table is fixed: unknown statuses park the order on hold for
//! manual review instead of guessing.

use crate::lifecycle::OrderStatus;

/// Maps a raw provider payment status to an order status.
///
/// Matching is case-insensitive. Captured and authorized money commits the
/// order, terminal failures release it, and pre-payment states leave it
/// pending. Anything else maps to on-hold with a warning.
#[must_use]
pub fn map_provider_status(raw: &str) -> OrderStatus {
    match raw.trim().to_ascii_uppercase().as_str() {
        "CAPTURED" | "PAID" | "AUTHORIZED" | "COMPLETED" | "CHARGED" | "PENDING_CAPTURE" => {
            OrderStatus::Processing
        }
        "CANCELLED" | "CANCELED" | "REJECTED" | "REFUSED" | "FAILED" | "REVERSED"
        | "CHARGEBACKED" => OrderStatus::Failed,
        "PENDING" | "CREATED" | "REDIRECTED" | "PENDING_PAYMENT" => OrderStatus::Pending,
        other => {
            tracing::warn!(status = %other, "unrecognized payment status, holding order");
            OrderStatus::OnHold
        }
    }
}

//! Stale gateway-order cleanup.
//!
//! Checkout creates a pending order before the customer ever sees the
//! payment page, so abandoned checkouts accumulate. The purge deletes
//! gateway-tagged orders stuck in non-committed states past a cutoff,
//! continuing past individual failures and reporting them per order.

use crate::client::OrdersClient;
use crate::error::OrdersError;
use booking_core::types::OrderId;
use chrono::{Duration, Utc};
use serde::Serialize;

/// Statuses eligible for purging by default.
pub const DEFAULT_STATUSES: &[&str] = &["cancelled", "failed", "pending"];

const SCAN_PAGE_SIZE: u32 = 100;

/// One order the purge could not delete.
#[derive(Clone, Debug, Serialize)]
pub struct CleanupFailure {
    /// Order that failed to delete.
    pub id: OrderId,
    /// Backend error message.
    pub message: String,
}

/// Outcome of one purge run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CleanupOutcome {
    /// Orders examined.
    pub scanned: usize,
    /// Orders deleted.
    pub deleted: Vec<OrderId>,
    /// Orders that failed to delete, with their errors.
    pub failed: Vec<CleanupFailure>,
}

/// Deletes stale gateway-tagged orders older than `days`.
///
/// Only orders carrying the gateway provider tag are touched; orders created
/// by other flows are never deleted. A failed delete is recorded and the run
/// continues.
///
/// # Errors
///
/// Returns [`OrdersError`] only when the initial listing fails; per-order
/// delete failures are reported in the outcome instead.
pub async fn purge_stale(
    client: &OrdersClient,
    days: i64,
    statuses: &[&str],
) -> Result<CleanupOutcome, OrdersError> {
    let candidates = client.list_orders(statuses, SCAN_PAGE_SIZE).await?;
    let cutoff = Utc::now() - Duration::days(days);

    let mut outcome = CleanupOutcome {
        scanned: candidates.len(),
        ..CleanupOutcome::default()
    };

    for order in candidates {
        let stale = order.is_gateway_order()
            && order
                .date_created_gmt
                .is_some_and(|created| created < cutoff);
        if !stale {
            continue;
        }

        match client.delete_order(order.id).await {
            Ok(_) => outcome.deleted.push(order.id),
            Err(error) => {
                tracing::warn!(order_id = order.id.value(), %error, "stale order delete failed");
                outcome.failed.push(CleanupFailure {
                    id: order.id,
                    message: error.to_string(),
                });
            }
        }
    }

    tracing::info!(
        scanned = outcome.scanned,
        deleted = outcome.deleted.len(),
        failed = outcome.failed.len(),
        "stale order purge finished"
    );
    Ok(outcome)
}

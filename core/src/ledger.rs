//! Reservation ledger trait and in-memory implementation.
//!
//! The ledger is the only mutable shared state of the core. Upserts must be
//! atomic at the storage layer, keyed on `(order_id, order_line_id)`: two
//! concurrent deliveries of the same committed event must serialize through
//! the uniqueness constraint, not race through a read-then-write pair.

use crate::availability::Occupancy;
use crate::error::LedgerError;
use crate::reservation::{Reservation, ReservationDraft, ReservationStatus};
use crate::types::{ItemSlug, OrderId, OrderLineId};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Durable record of capacity consumed by paid or pending orders.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// Inserts or updates the row keyed by `(order_id, order_line_id)` and
    /// marks it active. Idempotent: re-applying the same draft never creates
    /// a duplicate row or double-counts capacity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the storage layer fails.
    async fn upsert(&self, draft: ReservationDraft) -> Result<(), LedgerError>;

    /// Flips every row of the order to released, regardless of line.
    /// Returns the number of rows released.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the storage layer fails.
    async fn release_order(&self, order_id: OrderId) -> Result<u64, LedgerError>;

    /// Sums active quantities for one item over an inclusive date range,
    /// grouped by (date, slot).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the storage layer fails.
    async fn occupancy(
        &self,
        slug: &ItemSlug,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Occupancy, LedgerError>;
}

/// In-memory ledger for tests and local development.
///
/// A single mutex makes every upsert atomic, mirroring the uniqueness
/// constraint the PostgreSQL implementation relies on.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    rows: Mutex<HashMap<(OrderId, Option<OrderLineId>), Reservation>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows, active and released.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the ledger lock is poisoned.
    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.lock()?.len())
    }

    /// True when the ledger holds no rows at all.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the ledger lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.lock()?.is_empty())
    }

    /// Snapshot of all rows for one order, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the ledger lock is poisoned.
    pub fn rows_for_order(&self, order_id: OrderId) -> Result<Vec<Reservation>, LedgerError> {
        Ok(self
            .lock()?
            .values()
            .filter(|row| row.order_id == order_id)
            .cloned()
            .collect())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<(OrderId, Option<OrderLineId>), Reservation>>, LedgerError>
    {
        self.rows
            .lock()
            .map_err(|_| LedgerError::Persistence("ledger mutex poisoned".to_string()))
    }
}

#[async_trait]
impl ReservationLedger for InMemoryLedger {
    async fn upsert(&self, draft: ReservationDraft) -> Result<(), LedgerError> {
        let now = Utc::now();
        let mut rows = self.lock()?;
        let key = (draft.order_id, draft.order_line_id);
        match rows.get_mut(&key) {
            Some(existing) => {
                existing.item_type = draft.item_type;
                existing.item_slug = draft.item_slug;
                existing.scheduled_date = draft.scheduled_date;
                existing.time_slot = draft.time_slot;
                existing.quantity = draft.quantity;
                existing.status = ReservationStatus::Active;
                existing.updated_at = now;
            }
            None => {
                rows.insert(
                    key,
                    Reservation {
                        order_id: draft.order_id,
                        order_line_id: draft.order_line_id,
                        item_type: draft.item_type,
                        item_slug: draft.item_slug,
                        scheduled_date: draft.scheduled_date,
                        time_slot: draft.time_slot,
                        quantity: draft.quantity,
                        status: ReservationStatus::Active,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        Ok(())
    }

    async fn release_order(&self, order_id: OrderId) -> Result<u64, LedgerError> {
        let now = Utc::now();
        let mut rows = self.lock()?;
        let mut released = 0;
        for row in rows.values_mut().filter(|row| row.order_id == order_id) {
            row.status = ReservationStatus::Released;
            row.updated_at = now;
            released += 1;
        }
        Ok(released)
    }

    async fn occupancy(
        &self,
        slug: &ItemSlug,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Occupancy, LedgerError> {
        let rows = self.lock()?;
        let mut occupancy = Occupancy::new();
        for row in rows.values() {
            if row.status == ReservationStatus::Active
                && row.item_slug == *slug
                && row.scheduled_date >= from
                && row.scheduled_date <= to
            {
                occupancy.add(row.scheduled_date, row.time_slot.clone(), row.quantity);
            }
        }
        Ok(occupancy)
    }
}

//! PostgreSQL-backed reservation ledger.
//!
//! One row per (order, order line). Uniqueness is enforced by the database so
//! webhook replays and repeated status hooks collapse into the same row.
//! Releases are soft: rows flip to `released` and stop counting toward
//! occupancy, keeping an audit trail of freed capacity.

use async_trait::async_trait;
use booking_core::error::LedgerError;
use booking_core::ledger::ReservationLedger;
use booking_core::reservation::ReservationDraft;
use booking_core::types::{ItemSlug, OrderId, SlotLabel};
use booking_core::Occupancy;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Reservation table definition.
///
/// `order_line_id` stores zero for orders without an explicit line id; the
/// column stays NOT NULL so the composite unique key treats "no line" as one
/// distinct line rather than infinitely many NULLs.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS reservations (
    id             BIGSERIAL PRIMARY KEY,
    order_id       BIGINT NOT NULL,
    order_line_id  BIGINT NOT NULL DEFAULT 0,
    item_type      TEXT NOT NULL,
    item_slug      TEXT NOT NULL,
    scheduled_date DATE NOT NULL,
    time_slot      TEXT,
    quantity       INTEGER NOT NULL,
    status         TEXT NOT NULL DEFAULT 'active',
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (order_id, order_line_id)
);
CREATE INDEX IF NOT EXISTS reservations_occupancy_idx
    ON reservations (item_slug, scheduled_date)
    WHERE status = 'active';
";

/// Sentinel stored in `order_line_id` when the order has no explicit line.
const NO_LINE: i64 = 0;

/// PostgreSQL implementation of [`ReservationLedger`].
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Wraps an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and creates the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the connection fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| LedgerError::Persistence(format!("failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Creates the reservation table and indexes when missing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] when the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), LedgerError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Persistence(format!("failed to create schema: {e}")))?;
        Ok(())
    }

    /// The underlying pool, for health checks.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReservationLedger for PostgresLedger {
    async fn upsert(&self, draft: ReservationDraft) -> Result<(), LedgerError> {
        let line_id = draft.order_line_id.map_or(NO_LINE, |id| id.value());

        sqlx::query(
            r"
            INSERT INTO reservations
                (order_id, order_line_id, item_type, item_slug,
                 scheduled_date, time_slot, quantity, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'active')
            ON CONFLICT (order_id, order_line_id) DO UPDATE SET
                item_type      = EXCLUDED.item_type,
                item_slug      = EXCLUDED.item_slug,
                scheduled_date = EXCLUDED.scheduled_date,
                time_slot      = EXCLUDED.time_slot,
                quantity       = EXCLUDED.quantity,
                status         = 'active',
                updated_at     = now()
            ",
        )
        .bind(draft.order_id.value())
        .bind(line_id)
        .bind(draft.item_type.as_str())
        .bind(draft.item_slug.as_str())
        .bind(draft.scheduled_date)
        .bind(draft.time_slot.as_ref().map(SlotLabel::as_str))
        .bind(i64::from(draft.quantity))
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("failed to upsert reservation: {e}")))?;

        tracing::debug!(
            order_id = draft.order_id.value(),
            order_line_id = line_id,
            item_slug = %draft.item_slug,
            "reservation upserted"
        );
        Ok(())
    }

    async fn release_order(&self, order_id: OrderId) -> Result<u64, LedgerError> {
        let result = sqlx::query(
            r"
            UPDATE reservations
            SET status = 'released', updated_at = now()
            WHERE order_id = $1 AND status = 'active'
            ",
        )
        .bind(order_id.value())
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("failed to release reservations: {e}")))?;

        Ok(result.rows_affected())
    }

    async fn occupancy(
        &self,
        slug: &ItemSlug,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Occupancy, LedgerError> {
        let rows: Vec<(NaiveDate, Option<String>, i64)> = sqlx::query_as(
            r"
            SELECT scheduled_date, time_slot, SUM(quantity)::BIGINT AS booked
            FROM reservations
            WHERE item_slug = $1
              AND scheduled_date BETWEEN $2 AND $3
              AND status = 'active'
            GROUP BY scheduled_date, time_slot
            ",
        )
        .bind(slug.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Persistence(format!("failed to query occupancy: {e}")))?;

        let mut occupancy = Occupancy::new();
        for (date, slot, booked) in rows {
            let slot = slot.as_deref().and_then(SlotLabel::parse);
            occupancy.add(date, slot, u32::try_from(booked).unwrap_or(u32::MAX));
        }
        Ok(occupancy)
    }
}

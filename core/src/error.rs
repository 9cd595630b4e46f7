//! Error taxonomy of the booking core.

use crate::types::ItemSlug;
use thiserror::Error;

/// Errors from reservation ledger implementations.
///
/// Persistence failures must never be swallowed; callers either propagate
/// them or, in partial-batch operations, report them per item.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The storage layer failed to apply or read a ledger row.
    #[error("ledger persistence failed: {0}")]
    Persistence(String),
}

/// Errors from catalog (CMS) lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog backend could not be reached.
    #[error("catalog request failed: {0}")]
    Transport(String),
    /// The catalog response could not be decoded.
    #[error("catalog response invalid: {0}")]
    Decode(String),
}

/// Errors surfaced by the availability query interface.
#[derive(Debug, Error)]
pub enum AvailabilityError {
    /// The requested slug does not identify a bookable item. Surfaced to the
    /// caller as a 404-equivalent, never as an empty week.
    #[error("unknown bookable item: {0}")]
    NotFound(ItemSlug),
    /// Catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Occupancy read failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

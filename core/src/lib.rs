//! Booking domain core.
//!
//! This crate holds everything about weekly bookable capacity that does not
//! touch the network or a database driver:
//!
//! - **Domain types**: bookable items, weekly capacity rules, reservations.
//! - **Availability calculator**: a pure function turning (rules, occupancy
//!   snapshot, week start) into seven day descriptors with per-slot and
//!   per-day states.
//! - **Reservation ledger**: the trait all storage backends implement, plus
//!   an in-memory implementation used by tests and local development.
//! - **Lifecycle manager**: applies order-status transitions to the ledger
//!   with idempotent upserts and order-wide releases.
//! - **Payment status mapping**: the single table translating provider
//!   payment vocabulary into order-backend statuses.
//!
//! HTTP surfaces, the payment gateway adapter and the CMS/order-backend
//! clients live in sibling crates and depend on the traits defined here.

pub mod availability;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod payment;
pub mod reservation;
pub mod rules;
pub mod types;

pub use availability::{
    AvailabilityService, DayAvailability, DayState, Occupancy, SlotAvailability, SlotState,
    WeekAvailability,
};
pub use catalog::{BookableItem, ItemCatalog, PricingTier, StaticCatalog};
pub use error::{AvailabilityError, CatalogError, LedgerError};
pub use ledger::{InMemoryLedger, ReservationLedger};
pub use lifecycle::{
    LifecycleManager, LifecycleOutcome, OrderLine, OrderSchedule, OrderStatus, OrderStatusEvent,
    StatusBucket,
};
pub use payment::map_provider_status;
pub use reservation::{Reservation, ReservationDraft, ReservationStatus};
pub use rules::{WeeklyRule, WeeklyRuleSet};
pub use types::{ItemSlug, ItemType, OrderId, OrderLineId, SlotLabel};

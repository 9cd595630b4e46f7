//! Weekly availability calculator.
//!
//! The calculator is a pure function over (rules, occupancy snapshot, week
//! start). It produces exactly seven day descriptors starting at the supplied
//! date: callers are expected to pass a Monday, but the date is treated
//! literally as day 0 of the window, never normalized.

use crate::catalog::ItemCatalog;
use crate::error::AvailabilityError;
use crate::ledger::ReservationLedger;
use crate::rules::WeeklyRuleSet;
use crate::types::{ItemSlug, ItemType, SlotLabel};
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Occupancy state of a single slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    /// Full remaining capacity.
    Available,
    /// Some capacity consumed, some remaining.
    Limited,
    /// No remaining capacity (a zero-capacity rule is always full).
    Full,
}

/// Aggregated state of a day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayState {
    /// No rules for this weekday; the item is closed.
    Off,
    /// Every slot has full capacity remaining.
    Available,
    /// At least one slot is full (or partially consumed capacity exists).
    Limited,
    /// Every slot is full.
    Full,
}

/// Snapshot of active booked quantities, kept per slot and per date.
///
/// Built from a ledger read; slots with no active reservation are simply
/// absent and read as zero.
#[derive(Clone, Debug, Default)]
pub struct Occupancy {
    by_slot: HashMap<(NaiveDate, SlotLabel), u32>,
    by_date: HashMap<NaiveDate, u32>,
}

impl Occupancy {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds booked quantity for (date, slot).
    pub fn add(&mut self, date: NaiveDate, slot: Option<SlotLabel>, quantity: u32) {
        *self.by_date.entry(date).or_insert(0) += quantity;
        if let Some(slot) = slot {
            *self.by_slot.entry((date, slot)).or_insert(0) += quantity;
        }
    }

    /// Booked quantity for (date, slot); zero when absent.
    ///
    /// A whole-day query (`slot: None`) counts every active reservation on
    /// the date, labelled or not.
    #[must_use]
    pub fn booked(&self, date: NaiveDate, slot: Option<&SlotLabel>) -> u32 {
        match slot {
            Some(label) => self
                .by_slot
                .get(&(date, label.clone()))
                .copied()
                .unwrap_or(0),
            None => self.by_date.get(&date).copied().unwrap_or(0),
        }
    }
}

/// Occupancy descriptor of one slot on one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    /// Slot label; `None` serializes as `null` and means the whole day.
    pub slot: Option<SlotLabel>,
    /// Configured capacity.
    pub capacity: u32,
    /// Sum of active reserved quantities.
    pub booked: u32,
    /// Capacity remaining, clamped at zero.
    pub remaining: u32,
    /// Derived slot state.
    pub state: SlotState,
}

/// Occupancy descriptor of one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    /// Calendar date.
    pub date: NaiveDate,
    /// Slots in configured order; empty when the day has no rules.
    pub slots: Vec<SlotAvailability>,
    /// Aggregated day state.
    pub state: DayState,
}

/// A full week of availability for one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeekAvailability {
    /// Item kind.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Item slug.
    pub slug: ItemSlug,
    /// First day of the 7-day window, echoed back as supplied.
    pub week_start: NaiveDate,
    /// Exactly seven day descriptors.
    pub days: Vec<DayAvailability>,
}

/// Derives the state of a single slot.
#[must_use]
pub const fn slot_state(capacity: u32, remaining: u32) -> SlotState {
    if capacity == 0 || remaining == 0 {
        SlotState::Full
    } else if remaining < capacity {
        SlotState::Limited
    } else {
        SlotState::Available
    }
}

/// Aggregates slot states into a day state.
///
/// Two independent passes, deliberately without short-circuiting: any full
/// slot downgrades the day to limited, then a day whose slots are all full is
/// full. A day with a single full slot therefore reports full, not limited.
#[must_use]
pub fn day_state(slots: &[SlotAvailability]) -> DayState {
    if slots.is_empty() {
        return DayState::Off;
    }

    let mut state = DayState::Available;
    for slot in slots {
        if slot.state == SlotState::Full {
            state = DayState::Limited;
        }
    }

    let mut all_full = true;
    for slot in slots {
        if slot.state != SlotState::Full {
            all_full = false;
        }
    }
    if all_full {
        state = DayState::Full;
    }

    state
}

/// Computes a 7-day availability window starting at `week_start`.
#[must_use]
pub fn compute_week(
    item_type: ItemType,
    slug: &ItemSlug,
    rules: &WeeklyRuleSet,
    occupancy: &Occupancy,
    week_start: NaiveDate,
) -> WeekAvailability {
    let days = (0..7u64)
        .map(|offset| {
            let date = week_start
                .checked_add_days(Days::new(offset))
                .unwrap_or(week_start);
            compute_day(rules, occupancy, date)
        })
        .collect();

    WeekAvailability {
        item_type,
        slug: slug.clone(),
        week_start,
        days,
    }
}

fn compute_day(rules: &WeeklyRuleSet, occupancy: &Occupancy, date: NaiveDate) -> DayAvailability {
    let slots: Vec<SlotAvailability> = rules
        .rules_for(date.weekday())
        .iter()
        .map(|rule| {
            let booked = occupancy.booked(date, rule.slot.as_ref());
            let remaining = rule.capacity.saturating_sub(booked);
            SlotAvailability {
                slot: rule.slot.clone(),
                capacity: rule.capacity,
                booked,
                remaining,
                state: slot_state(rule.capacity, remaining),
            }
        })
        .collect();

    let state = day_state(&slots);
    DayAvailability { date, slots, state }
}

/// The availability query interface: resolves an item through the catalog,
/// snapshots occupancy from the ledger and computes a week.
#[derive(Clone)]
pub struct AvailabilityService {
    catalog: Arc<dyn ItemCatalog>,
    ledger: Arc<dyn ReservationLedger>,
}

impl AvailabilityService {
    /// Creates a new service over the given catalog and ledger.
    #[must_use]
    pub fn new(catalog: Arc<dyn ItemCatalog>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { catalog, ledger }
    }

    /// Computes the week of availability starting at `week_start`.
    ///
    /// # Errors
    ///
    /// Returns [`AvailabilityError::NotFound`] for an unknown slug, or a
    /// catalog/ledger error when a backend fails.
    pub async fn week(
        &self,
        slug: &ItemSlug,
        week_start: NaiveDate,
    ) -> Result<WeekAvailability, AvailabilityError> {
        let item = self
            .catalog
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AvailabilityError::NotFound(slug.clone()))?;

        let week_end = week_start
            .checked_add_days(Days::new(6))
            .unwrap_or(week_start);
        let occupancy = self.ledger.occupancy(slug, week_start, week_end).await?;

        Ok(compute_week(
            item.item_type,
            slug,
            &item.rules,
            &occupancy,
            week_start,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rules::WeeklyRule;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn monday() -> NaiveDate {
        // 2025-03-10 is a Monday.
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn rules_with(weekday: Weekday, entries: &[(Option<&str>, u32)]) -> WeeklyRuleSet {
        let mut rules = WeeklyRuleSet::new();
        for (slot, capacity) in entries {
            rules.add(
                weekday,
                WeeklyRule {
                    slot: slot.and_then(SlotLabel::parse),
                    capacity: *capacity,
                },
            );
        }
        rules
    }

    fn slot(state: SlotState) -> SlotAvailability {
        SlotAvailability {
            slot: SlotLabel::parse("x"),
            capacity: 2,
            booked: 0,
            remaining: 2,
            state,
        }
    }

    #[test]
    fn week_without_rules_is_all_off() {
        let week = compute_week(
            ItemType::Service,
            &ItemSlug::from("menage"),
            &WeeklyRuleSet::new(),
            &Occupancy::new(),
            monday(),
        );

        assert_eq!(week.days.len(), 7);
        for day in &week.days {
            assert_eq!(day.state, DayState::Off);
            assert!(day.slots.is_empty());
        }
    }

    #[test]
    fn week_covers_seven_consecutive_dates() {
        let week = compute_week(
            ItemType::Service,
            &ItemSlug::from("menage"),
            &WeeklyRuleSet::new(),
            &Occupancy::new(),
            monday(),
        );

        for (offset, day) in week.days.iter().enumerate() {
            assert_eq!(
                day.date,
                monday() + Days::new(offset as u64),
            );
        }
    }

    #[test]
    fn zero_capacity_rule_is_full_regardless_of_bookings() {
        let rules = rules_with(Weekday::Mon, &[(Some("09:00-12:00"), 0)]);
        let week = compute_week(
            ItemType::Service,
            &ItemSlug::from("menage"),
            &rules,
            &Occupancy::new(),
            monday(),
        );

        let slot = &week.days[0].slots[0];
        assert_eq!(slot.state, SlotState::Full);
        assert_eq!(slot.remaining, 0);
    }

    #[test]
    fn fully_booked_slot_reports_full_day() {
        // Monday rule {slot: "09:00-12:00", capacity: 2} with two active
        // reservations of quantity 1.
        let rules = rules_with(Weekday::Mon, &[(Some("09:00-12:00"), 2)]);
        let mut occupancy = Occupancy::new();
        occupancy.add(monday(), SlotLabel::parse("09:00-12:00"), 1);
        occupancy.add(monday(), SlotLabel::parse("09:00-12:00"), 1);

        let week = compute_week(
            ItemType::Service,
            &ItemSlug::from("menage"),
            &rules,
            &occupancy,
            monday(),
        );

        let day = &week.days[0];
        let slot = &day.slots[0];
        assert_eq!(slot.booked, 2);
        assert_eq!(slot.remaining, 0);
        assert_eq!(slot.state, SlotState::Full);
        assert_eq!(day.state, DayState::Full);
    }

    #[test]
    fn partially_booked_slot_is_limited() {
        // Same setup with one reservation released: only one still counts.
        let rules = rules_with(Weekday::Mon, &[(Some("09:00-12:00"), 2)]);
        let mut occupancy = Occupancy::new();
        occupancy.add(monday(), SlotLabel::parse("09:00-12:00"), 1);

        let week = compute_week(
            ItemType::Service,
            &ItemSlug::from("menage"),
            &rules,
            &occupancy,
            monday(),
        );

        let slot = &week.days[0].slots[0];
        assert_eq!(slot.booked, 1);
        assert_eq!(slot.remaining, 1);
        assert_eq!(slot.state, SlotState::Limited);
    }

    #[test]
    fn booked_beyond_capacity_clamps_remaining_at_zero() {
        let rules = rules_with(Weekday::Mon, &[(Some("09:00-12:00"), 2)]);
        let mut occupancy = Occupancy::new();
        occupancy.add(monday(), SlotLabel::parse("09:00-12:00"), 5);

        let week = compute_week(
            ItemType::Service,
            &ItemSlug::from("menage"),
            &rules,
            &occupancy,
            monday(),
        );

        assert_eq!(week.days[0].slots[0].remaining, 0);
    }

    #[test]
    fn slot_without_rule_is_absent_from_the_day() {
        let rules = rules_with(Weekday::Mon, &[(Some("09:00-12:00"), 2)]);
        let mut occupancy = Occupancy::new();
        // A reservation on an unconfigured slot never materializes a
        // synthetic zero-capacity slot.
        occupancy.add(monday(), SlotLabel::parse("18:00-20:00"), 1);

        let week = compute_week(
            ItemType::Service,
            &ItemSlug::from("menage"),
            &rules,
            &occupancy,
            monday(),
        );

        assert_eq!(week.days[0].slots.len(), 1);
    }

    #[test]
    fn whole_day_rule_counts_whole_day_bookings() {
        let rules = rules_with(Weekday::Sat, &[(None, 3)]);
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let mut occupancy = Occupancy::new();
        occupancy.add(saturday, None, 2);

        let week = compute_week(
            ItemType::Subscription,
            &ItemSlug::from("entretien"),
            &rules,
            &occupancy,
            monday(),
        );

        let day = &week.days[5];
        assert_eq!(day.date, saturday);
        assert_eq!(day.slots[0].booked, 2);
        assert_eq!(day.slots[0].state, SlotState::Limited);
    }

    #[test]
    fn whole_day_rule_counts_slot_labelled_bookings_too() {
        let rules = rules_with(Weekday::Mon, &[(None, 2)]);
        let mut occupancy = Occupancy::new();
        occupancy.add(monday(), SlotLabel::parse("09:00-12:00"), 2);

        let week = compute_week(
            ItemType::Service,
            &ItemSlug::from("menage"),
            &rules,
            &occupancy,
            monday(),
        );

        let slot = &week.days[0].slots[0];
        assert_eq!(slot.booked, 2);
        assert_eq!(slot.remaining, 0);
        assert_eq!(slot.state, SlotState::Full);
    }

    #[test]
    fn day_state_mixes_full_and_limited() {
        assert_eq!(
            day_state(&[slot(SlotState::Full), slot(SlotState::Limited)]),
            DayState::Limited
        );
        assert_eq!(
            day_state(&[slot(SlotState::Full), slot(SlotState::Full)]),
            DayState::Full
        );
        assert_eq!(
            day_state(&[slot(SlotState::Available), slot(SlotState::Available)]),
            DayState::Available
        );
        // A limited slot alone never downgrades the day.
        assert_eq!(
            day_state(&[slot(SlotState::Limited), slot(SlotState::Available)]),
            DayState::Available
        );
        assert_eq!(day_state(&[]), DayState::Off);
    }

    #[test]
    fn single_full_slot_makes_the_day_full() {
        // Both aggregation passes run: the all-full pass wins over the
        // any-full downgrade.
        assert_eq!(day_state(&[slot(SlotState::Full)]), DayState::Full);
    }

    #[tokio::test]
    async fn service_rejects_unknown_slug() {
        let catalog = Arc::new(crate::catalog::StaticCatalog::new());
        let ledger = Arc::new(crate::ledger::InMemoryLedger::new());
        let service = AvailabilityService::new(catalog, ledger);

        let result = service.week(&ItemSlug::from("nope"), monday()).await;
        assert!(matches!(result, Err(AvailabilityError::NotFound(_))));
    }

    proptest! {
        #[test]
        fn remaining_never_exceeds_capacity_and_never_underflows(
            capacity in 0u32..=100,
            booked in 0u32..=200,
        ) {
            let remaining = capacity.saturating_sub(booked);
            let state = slot_state(capacity, remaining);
            prop_assert!(remaining <= capacity);
            if capacity == 0 {
                prop_assert_eq!(state, SlotState::Full);
            }
            if booked >= capacity {
                prop_assert_eq!(remaining, 0);
                prop_assert_eq!(state, SlotState::Full);
            }
        }
    }
}

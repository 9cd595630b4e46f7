//! Weekly capacity rules.
//!
//! The CMS stores per-item availability rules as JSON keyed by lowercase
//! three-letter weekday abbreviation (`mon`..`sun`), each value a list of
//! `{slot, capacity}` pairs. A missing weekday means the item is closed that
//! day. An empty slot string means the rule covers the whole day.

use crate::types::SlotLabel;
use chrono::Weekday;
use serde::Deserialize;
use std::collections::HashMap;

/// A recurring capacity definition for one weekday and slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeeklyRule {
    /// Slot the rule applies to; `None` means the whole day.
    pub slot: Option<SlotLabel>,
    /// Total concurrent bookings allowed. Zero is valid and means the slot
    /// is permanently full.
    pub capacity: u32,
}

/// All weekly rules of one bookable item, keyed by weekday.
///
/// Slot order within a day is preserved from the CMS configuration so the
/// availability output renders slots in the configured order. At most one
/// rule exists per (weekday, slot); duplicate configuration entries keep the
/// first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeeklyRuleSet {
    by_day: HashMap<Weekday, Vec<WeeklyRule>>,
}

/// Raw deserialization shape for one CMS rule entry.
#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(default)]
    slot: Option<String>,
    #[serde(default)]
    capacity: u32,
}

impl WeeklyRuleSet {
    /// Creates an empty rule set (closed every day).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, ignoring duplicates of an already-present
    /// (weekday, slot) pair.
    pub fn add(&mut self, weekday: Weekday, rule: WeeklyRule) {
        let day = self.by_day.entry(weekday).or_default();
        if day.iter().any(|existing| existing.slot == rule.slot) {
            tracing::warn!(
                weekday = %weekday,
                slot = rule.slot.as_ref().map_or("<whole day>", SlotLabel::as_str),
                "duplicate weekly rule ignored"
            );
            return;
        }
        day.push(rule);
    }

    /// Rules for one weekday, in configured order. Empty when closed.
    #[must_use]
    pub fn rules_for(&self, weekday: Weekday) -> &[WeeklyRule] {
        self.by_day.get(&weekday).map_or(&[], Vec::as_slice)
    }

    /// True when no weekday has any rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_day.values().all(Vec::is_empty)
    }

    /// Decodes the CMS JSON shape.
    ///
    /// Unknown weekday keys are skipped with a warning. A value that is not
    /// a rule list makes the whole document invalid; callers decide whether
    /// that degrades to an empty rule set.
    ///
    /// # Errors
    ///
    /// Returns the underlying decode error when the document is not an
    /// object of weekday keys to rule lists.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, Vec<RawRule>> =
            serde_json::from_value(value.clone())?;

        let mut rules = Self::new();
        for (key, entries) in raw {
            let Some(weekday) = weekday_from_abbrev(&key) else {
                tracing::warn!(key = %key, "unknown weekday key in availability rules");
                continue;
            };
            for entry in entries {
                let slot = entry.slot.as_deref().and_then(SlotLabel::parse);
                rules.add(
                    weekday,
                    WeeklyRule {
                        slot,
                        capacity: entry.capacity,
                    },
                );
            }
        }
        Ok(rules)
    }
}

/// Maps the CMS weekday abbreviation to a [`Weekday`].
#[must_use]
pub fn weekday_from_abbrev(key: &str) -> Option<Weekday> {
    match key {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

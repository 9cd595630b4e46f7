//! Bookable item catalog.
//!
//! Item lifecycle is owned by the CMS; the core only reads. The HTTP-backed
//! catalog lives in the `booking-cms` crate; [`StaticCatalog`] serves tests
//! and local development.

use crate::error::CatalogError;
use crate::rules::WeeklyRuleSet;
use crate::types::{ItemSlug, ItemType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One explicit pricing tier of a bookable item.
///
/// Tiers are a typed list populated by the CMS sync step; they are never
/// discovered by pattern-matching arbitrary metadata keys at read time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    /// Stable tier key (e.g. `"unit"`, `"pack4"`).
    pub key: String,
    /// Display label.
    pub label: String,
    /// Price in minor currency units.
    pub amount_minor: u64,
}

/// A service or subscription offering that can be scheduled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookableItem {
    /// Unique slug.
    pub slug: ItemSlug,
    /// Service or subscription.
    pub item_type: ItemType,
    /// Weekly capacity rules.
    pub rules: WeeklyRuleSet,
    /// Explicit pricing tiers.
    pub pricing_tiers: Vec<PricingTier>,
}

/// Read-only item lookup.
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Finds an item by slug. `Ok(None)` means the slug is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog backend fails.
    async fn find_by_slug(&self, slug: &ItemSlug) -> Result<Option<BookableItem>, CatalogError>;
}

/// Fixed in-memory catalog for tests and local development.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    items: HashMap<ItemSlug, BookableItem>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item, replacing any previous item with the same slug.
    pub fn insert(&mut self, item: BookableItem) {
        self.items.insert(item.slug.clone(), item);
    }
}

#[async_trait]
impl ItemCatalog for StaticCatalog {
    async fn find_by_slug(&self, slug: &ItemSlug) -> Result<Option<BookableItem>, CatalogError> {
        Ok(self.items.get(slug).cloned())
    }
}

//! Headless-CMS catalog client.
//!
//! Bookable items live in the CMS as two collections, `services` and
//! `subscriptions`, each queryable by slug. A lookup tries services first
//! and falls back to subscriptions; the winning collection decides the item
//! type. Weekly availability rules arrive as a JSON document in the item's
//! meta; a malformed document degrades to an empty rule set (closed every
//! day) rather than failing the lookup.

use async_trait::async_trait;
use booking_core::catalog::{BookableItem, ItemCatalog, PricingTier};
use booking_core::error::CatalogError;
use booking_core::rules::WeeklyRuleSet;
use booking_core::types::{ItemSlug, ItemType};
use reqwest::Client;
use serde::Deserialize;

/// Raw CMS item record.
#[derive(Debug, Deserialize)]
struct CmsItem {
    slug: String,
    #[serde(default)]
    meta: CmsMeta,
}

#[derive(Debug, Default, Deserialize)]
struct CmsMeta {
    /// Weekly rules, either inline JSON or a JSON-encoded string.
    #[serde(default)]
    availability_rules: Option<serde_json::Value>,
    #[serde(default)]
    pricing_tiers: Vec<PricingTier>,
}

/// HTTP-backed [`ItemCatalog`].
#[derive(Clone)]
pub struct CmsCatalog {
    http: Client,
    base_url: String,
}

impl CmsCatalog {
    /// Creates a catalog over the CMS REST base URL (no trailing slash).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn fetch_collection(
        &self,
        collection: &str,
        slug: &ItemSlug,
    ) -> Result<Option<CmsItem>, CatalogError> {
        let url = format!("{}/{collection}", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("slug", slug.as_str()), ("per_page", "1")])
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Transport(format!(
                "{collection} lookup failed with status {status}"
            )));
        }

        let mut items: Vec<CmsItem> = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))?;

        Ok(if items.is_empty() {
            None
        } else {
            Some(items.remove(0))
        })
    }
}

#[async_trait]
impl ItemCatalog for CmsCatalog {
    async fn find_by_slug(&self, slug: &ItemSlug) -> Result<Option<BookableItem>, CatalogError> {
        let (item, item_type) = match self.fetch_collection("services", slug).await? {
            Some(item) => (item, ItemType::Service),
            None => match self.fetch_collection("subscriptions", slug).await? {
                Some(item) => (item, ItemType::Subscription),
                None => return Ok(None),
            },
        };

        Ok(Some(BookableItem {
            slug: ItemSlug::new(item.slug),
            item_type,
            rules: decode_rules(slug, item.meta.availability_rules.as_ref()),
            pricing_tiers: item.meta.pricing_tiers,
        }))
    }
}

/// Decodes the rules document, degrading to an empty set on malformed input.
fn decode_rules(slug: &ItemSlug, raw: Option<&serde_json::Value>) -> WeeklyRuleSet {
    let Some(raw) = raw else {
        return WeeklyRuleSet::new();
    };

    // Some CMS setups store the document as a JSON-encoded string.
    let inline;
    let document = match raw {
        serde_json::Value::String(text) => {
            match serde_json::from_str::<serde_json::Value>(text) {
                Ok(parsed) => {
                    inline = parsed;
                    &inline
                }
                Err(error) => {
                    tracing::warn!(slug = %slug, %error, "unreadable availability rules, treating item as closed");
                    return WeeklyRuleSet::new();
                }
            }
        }
        other => other,
    };

    match WeeklyRuleSet::from_json(document) {
        Ok(rules) => rules,
        Err(error) => {
            tracing::warn!(slug = %slug, %error, "invalid availability rules, treating item as closed");
            WeeklyRuleSet::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn finds_a_service_with_rules_and_tiers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services"))
            .and(query_param("slug", "menage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "slug": "menage",
                "meta": {
                    "availability_rules": {
                        "mon": [{"slot": "09:00-12:00", "capacity": 2}]
                    },
                    "pricing_tiers": [
                        {"key": "unit", "label": "1 passage", "amount_minor": 4500}
                    ]
                }
            }])))
            .mount(&server)
            .await;

        let catalog = CmsCatalog::new(server.uri());
        let item = catalog
            .find_by_slug(&ItemSlug::from("menage"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(item.item_type, ItemType::Service);
        assert_eq!(item.rules.rules_for(Weekday::Mon).len(), 1);
        assert_eq!(item.pricing_tiers[0].amount_minor, 4500);
    }

    #[tokio::test]
    async fn falls_back_to_subscriptions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/subscriptions"))
            .and(query_param("slug", "entretien"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "slug": "entretien",
                "meta": {}
            }])))
            .mount(&server)
            .await;

        let catalog = CmsCatalog::new(server.uri());
        let item = catalog
            .find_by_slug(&ItemSlug::from("entretien"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(item.item_type, ItemType::Subscription);
        assert!(item.rules.is_empty());
    }

    #[tokio::test]
    async fn unknown_slug_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let catalog = CmsCatalog::new(server.uri());
        let item = catalog.find_by_slug(&ItemSlug::from("nope")).await.unwrap();
        assert!(item.is_none());
    }

    #[tokio::test]
    async fn malformed_rules_degrade_to_closed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "slug": "menage",
                "meta": { "availability_rules": "{not json" }
            }])))
            .mount(&server)
            .await;

        let catalog = CmsCatalog::new(server.uri());
        let item = catalog
            .find_by_slug(&ItemSlug::from("menage"))
            .await
            .unwrap()
            .unwrap();

        assert!(item.rules.is_empty());
    }

    #[tokio::test]
    async fn string_encoded_rules_are_decoded() {
        let server = MockServer::start().await;
        let rules = json!({"sat": [{"slot": "", "capacity": 3}]}).to_string();
        Mock::given(method("GET"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "slug": "menage",
                "meta": { "availability_rules": rules }
            }])))
            .mount(&server)
            .await;

        let catalog = CmsCatalog::new(server.uri());
        let item = catalog
            .find_by_slug(&ItemSlug::from("menage"))
            .await
            .unwrap()
            .unwrap();

        let saturday = item.rules.rules_for(Weekday::Sat);
        assert_eq!(saturday.len(), 1);
        assert_eq!(saturday[0].slot, None);
        assert_eq!(saturday[0].capacity, 3);
    }

    #[tokio::test]
    async fn backend_failure_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let catalog = CmsCatalog::new(server.uri());
        let result = catalog.find_by_slug(&ItemSlug::from("menage")).await;
        assert!(matches!(result, Err(CatalogError::Transport(_))));
    }
}

//! End-to-end API tests against a router wired with the in-memory ledger,
//! a static catalog and a mocked order backend / payment provider.

#![allow(clippy::unwrap_used)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use booking_core::catalog::{BookableItem, StaticCatalog};
use booking_core::ledger::InMemoryLedger;
use booking_core::reservation::ReservationStatus;
use booking_core::rules::{WeeklyRule, WeeklyRuleSet};
use booking_core::types::{ItemSlug, ItemType, OrderId, OrderLineId, SlotLabel};
use booking_gateway::webhook::sign;
use booking_gateway::{GatewayConfig, HostedCheckoutClient, WebhookVerifier};
use booking_orders::OrdersClient;
use booking_web::config::{
    CleanupConfig, CmsConfig, Config, DatabaseConfig, OrdersConfig, PaymentsConfig, ServerConfig,
};
use booking_web::{build_router, AppState};
use chrono::Weekday;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBHOOK_KEY_ID: &str = "key-1";
const WEBHOOK_SECRET: &str = "whsec-test";

struct TestApp {
    server: TestServer,
    ledger: Arc<InMemoryLedger>,
}

fn menage_catalog() -> StaticCatalog {
    let mut rules = WeeklyRuleSet::new();
    rules.add(
        Weekday::Mon,
        WeeklyRule {
            slot: SlotLabel::parse("09:00-12:00"),
            capacity: 2,
        },
    );

    let mut catalog = StaticCatalog::new();
    catalog.insert(BookableItem {
        slug: ItemSlug::from("menage"),
        item_type: ItemType::Service,
        rules,
        pricing_tiers: Vec::new(),
    });
    catalog
}

fn test_config(backend_url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_base_url: "https://shop.example.com".to_string(),
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
        cms: CmsConfig {
            base_url: String::new(),
        },
        orders: OrdersConfig {
            rest_url: backend_url.to_string(),
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            default_product_id: 11,
        },
        payments: PaymentsConfig {
            enabled: true,
            expose_debug: false,
            webhook_url: None,
            webhook_key_id: Some(WEBHOOK_KEY_ID.to_string()),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        },
        cleanup: CleanupConfig {
            token: "cleanup-token".to_string(),
            days: 14,
        },
    }
}

fn spawn_app(backend: &MockServer, gateway: Option<HostedCheckoutClient>) -> TestApp {
    let ledger = Arc::new(InMemoryLedger::new());
    let config = Arc::new(test_config(&backend.uri()));
    let state = AppState::new(
        Arc::new(menage_catalog()),
        Arc::clone(&ledger) as Arc<dyn booking_core::ledger::ReservationLedger>,
        gateway,
        WebhookVerifier::new().with_key(WEBHOOK_KEY_ID, WEBHOOK_SECRET),
        Arc::new(OrdersClient::new(backend.uri(), "ck", "cs")),
        config,
    );

    TestApp {
        server: TestServer::new(build_router(state)).unwrap(),
        ledger,
    }
}

fn gateway_client(provider: &MockServer) -> HostedCheckoutClient {
    HostedCheckoutClient::new(GatewayConfig {
        environment: booking_gateway::Environment::Preprod,
        api_host: "payment.preprod.example".to_string(),
        api_key_id: "key".to_string(),
        api_secret: "secret".to_string(),
        merchant_id: "m-1".to_string(),
        integrator: "tests".to_string(),
    })
    .with_base_url(provider.uri())
}

fn commit_event(order_id: i64, line_id: i64) -> Value {
    json!({
        "order_id": order_id,
        "status": "processing",
        "lines": [{"line_id": line_id, "quantity": 1}],
        "schedule": {
            "item_type": "service",
            "item_slug": "menage",
            "scheduled_date": "2025-03-10",
            "time_slot": "09:00-12:00"
        }
    })
}

// ============================================================================
// Availability
// ============================================================================

#[tokio::test]
async fn fully_booked_monday_reports_full() {
    let backend = MockServer::start().await;
    let app = spawn_app(&backend, None);

    for (order, line) in [(100, 1), (101, 1)] {
        app.server
            .post("/api/orders/events")
            .json(&commit_event(order, line))
            .await
            .assert_status_ok();
    }

    let response = app
        .server
        .get("/api/availability")
        .add_query_param("slug", "menage")
        .add_query_param("week_start", "2025-03-10")
        .await;
    response.assert_status_ok();

    let week: Value = response.json();
    assert_eq!(week["type"], "service");
    assert_eq!(week["week_start"], "2025-03-10");
    assert_eq!(week["days"].as_array().unwrap().len(), 7);

    let monday = &week["days"][0];
    assert_eq!(monday["state"], "full");
    let slot = &monday["slots"][0];
    assert_eq!(slot["booked"], 2);
    assert_eq!(slot["remaining"], 0);
    assert_eq!(slot["state"], "full");

    // Tuesday has no rules.
    assert_eq!(week["days"][1]["state"], "off");
}

#[tokio::test]
async fn releasing_one_order_frees_a_slot() {
    let backend = MockServer::start().await;
    let app = spawn_app(&backend, None);

    for (order, line) in [(100, 1), (101, 1)] {
        app.server
            .post("/api/orders/events")
            .json(&commit_event(order, line))
            .await
            .assert_status_ok();
    }
    app.server
        .post("/api/orders/events")
        .json(&json!({
            "order_id": 101,
            "status": "cancelled",
            "lines": [],
            "schedule": {}
        }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get("/api/availability")
        .add_query_param("slug", "menage")
        .add_query_param("week_start", "2025-03-10")
        .await;

    let week: Value = response.json();
    let slot = &week["days"][0]["slots"][0];
    assert_eq!(slot["booked"], 1);
    assert_eq!(slot["remaining"], 1);
    assert_eq!(slot["state"], "limited");
    // A limited slot alone never downgrades the day.
    assert_eq!(week["days"][0]["state"], "available");
}

#[tokio::test]
async fn unknown_slug_is_a_404() {
    let backend = MockServer::start().await;
    let app = spawn_app(&backend, None);

    let response = app
        .server
        .get("/api/availability")
        .add_query_param("slug", "nope")
        .add_query_param("week_start", "2025-03-10")
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn missing_parameters_are_a_400() {
    let backend = MockServer::start().await;
    let app = spawn_app(&backend, None);

    app.server
        .get("/api/availability")
        .add_query_param("slug", "menage")
        .await
        .assert_status_bad_request();
    app.server
        .get("/api/availability")
        .add_query_param("slug", "menage")
        .add_query_param("week_start", "next monday")
        .await
        .assert_status_bad_request();
}

// ============================================================================
// Webhooks
// ============================================================================

fn signed_webhook(body: &Value) -> (String, String) {
    let raw = body.to_string();
    let signature = sign(WEBHOOK_SECRET, raw.as_bytes());
    (raw, signature)
}

async fn post_webhook(server: &TestServer, raw: String, signature: &str) -> TestResponse {
    server
        .post("/api/webhooks/payment")
        .add_header(
            HeaderName::from_static("x-gcs-keyid"),
            HeaderValue::from_static(WEBHOOK_KEY_ID),
        )
        .add_header(
            HeaderName::from_static("x-gcs-signature"),
            HeaderValue::from_str(signature).unwrap(),
        )
        .text(raw)
        .await
}

#[tokio::test]
async fn invalid_signature_is_rejected_without_state_change() {
    let backend = MockServer::start().await;
    let app = spawn_app(&backend, None);

    let body = json!({
        "payment": {
            "status": "CAPTURED",
            "references": {"merchantReference": "wc_412"}
        }
    });

    let response = post_webhook(&app.server, body.to_string(), "AAAA").await;

    response.assert_status_bad_request();
    assert!(app.ledger.is_empty().unwrap());
    // No order backend call happened either.
    assert!(backend.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unparsable_reference_is_acknowledged_without_mutation() {
    let backend = MockServer::start().await;
    let app = spawn_app(&backend, None);

    let body = json!({
        "payment": {
            "status": "CAPTURED",
            "references": {"merchantReference": "order-412"}
        }
    });
    let (raw, signature) = signed_webhook(&body);

    let response = post_webhook(&app.server, raw, &signature).await;

    response.assert_status_ok();
    assert!(app.ledger.is_empty().unwrap());
    assert!(backend.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn refused_payment_releases_the_reservation() {
    let backend = MockServer::start().await;
    let order_json = json!({
        "id": 412,
        "status": "pending",
        "line_items": [{"id": 7, "quantity": 1, "name": "Ménage"}],
        "meta_data": [
            {"key": "item_type", "value": "service"},
            {"key": "service_slug", "value": "menage"},
            {"key": "scheduled_date", "value": "2025-03-10"},
            {"key": "time_slot", "value": "09:00-12:00"}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/orders/412"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&order_json))
        .mount(&backend)
        .await;
    Mock::given(method("PUT"))
        .and(path("/orders/412"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&order_json))
        .mount(&backend)
        .await;

    let app = spawn_app(&backend, None);
    app.server
        .post("/api/orders/events")
        .json(&commit_event(412, 7))
        .await
        .assert_status_ok();

    let body = json!({
        "type": "payment.refused",
        "payment": {
            "status": "REFUSED",
            "references": {"merchantReference": "wc_412"}
        }
    });
    let (raw, signature) = signed_webhook(&body);

    post_webhook(&app.server, raw, &signature)
        .await
        .assert_status_ok();

    let rows = app.ledger.rows_for_order(OrderId::new(412)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, ReservationStatus::Released);
}

#[tokio::test]
async fn captured_payment_commits_the_reservation() {
    let backend = MockServer::start().await;
    let order_json = json!({
        "id": 413,
        "status": "pending",
        "line_items": [{"id": 9, "quantity": 2, "name": "Ménage"}],
        "meta_data": [
            {"key": "item_type", "value": "service"},
            {"key": "service_slug", "value": "menage"},
            {"key": "scheduled_date", "value": "2025-03-10"},
            {"key": "time_slot", "value": "09:00-12:00"}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/orders/413"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&order_json))
        .mount(&backend)
        .await;
    Mock::given(method("PUT"))
        .and(path("/orders/413"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&order_json))
        .mount(&backend)
        .await;

    let app = spawn_app(&backend, None);

    let body = json!({
        "payment": {
            "status": "CAPTURED",
            "references": {"merchantReference": "wc_413"}
        }
    });
    let (raw, signature) = signed_webhook(&body);

    post_webhook(&app.server, raw, &signature)
        .await
        .assert_status_ok();

    let rows = app.ledger.rows_for_order(OrderId::new(413)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, ReservationStatus::Active);
    assert_eq!(rows[0].quantity, 2);
    assert_eq!(rows[0].order_line_id, Some(OrderLineId::new(9)));
}

// ============================================================================
// Checkout
// ============================================================================

fn checkout_body() -> Value {
    json!({
        "serviceName": "Ménage à domicile",
        "serviceSlug": "menage",
        "itemType": "service",
        "amount": "45,00",
        "customerEmail": "client@example.com",
        "scheduledDate": "2025-03-10",
        "timeSlot": "09:00-12:00"
    })
}

#[tokio::test]
async fn checkout_creates_an_order_and_a_session() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 500,
            "status": "pending"
        })))
        .mount(&backend)
        .await;
    Mock::given(method("PUT"))
        .and(path("/orders/500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 500,
            "status": "pending"
        })))
        .mount(&backend)
        .await;

    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/m-1/hostedcheckouts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "hostedCheckoutId": "hc-42",
            "partialRedirectUrl": "preprod.example/pay/hc-42"
        })))
        .mount(&provider)
        .await;

    let app = spawn_app(&backend, Some(gateway_client(&provider)));

    let response = app.server.post("/api/checkout").json(&checkout_body()).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["orderId"], 500);
    assert_eq!(body["sessionId"], "hc-42");
    assert_eq!(
        body["redirectUrl"],
        "https://payment.preprod.example/pay/hc-42"
    );
}

#[tokio::test]
async fn gateway_decline_marks_the_order_failed() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 501,
            "status": "pending"
        })))
        .mount(&backend)
        .await;
    let failed_update = Mock::given(method("PUT"))
        .and(path("/orders/501"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 501,
            "status": "failed"
        })))
        .expect(1);
    failed_update.mount(&backend).await;

    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"errorId":"declined"}"#))
        .mount(&provider)
        .await;

    let app = spawn_app(&backend, Some(gateway_client(&provider)));

    let response = app.server.post("/api/checkout").json(&checkout_body()).await;
    assert_eq!(response.status_code(), 502);
}

#[tokio::test]
async fn checkout_validates_before_calling_anything() {
    let backend = MockServer::start().await;
    let provider = MockServer::start().await;
    let app = spawn_app(&backend, Some(gateway_client(&provider)));

    let mut body = checkout_body();
    body["customerEmail"] = json!("");

    app.server
        .post("/api/checkout")
        .json(&body)
        .await
        .assert_status_bad_request();
    assert!(backend.received_requests().await.unwrap().is_empty());
    assert!(provider.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn checkout_refuses_when_payments_are_disabled() {
    let backend = MockServer::start().await;
    let ledger = Arc::new(InMemoryLedger::new());
    let mut config = test_config(&backend.uri());
    config.payments.enabled = false;

    let state = AppState::new(
        Arc::new(menage_catalog()),
        ledger as Arc<dyn booking_core::ledger::ReservationLedger>,
        None,
        WebhookVerifier::new().with_key(WEBHOOK_KEY_ID, WEBHOOK_SECRET),
        Arc::new(OrdersClient::new(backend.uri(), "ck", "cs")),
        Arc::new(config),
    );
    let server = TestServer::new(build_router(state)).unwrap();

    server
        .post("/api/checkout")
        .json(&checkout_body())
        .await
        .assert_status_forbidden();
}

// ============================================================================
// Cleanup
// ============================================================================

#[tokio::test]
async fn cleanup_requires_the_token() {
    let backend = MockServer::start().await;
    let app = spawn_app(&backend, None);

    app.server
        .post("/api/orders/cleanup")
        .await
        .assert_status_unauthorized();

    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&backend)
        .await;

    let response = app
        .server
        .post("/api/orders/cleanup")
        .add_header(
            HeaderName::from_static("x-cleanup-token"),
            HeaderValue::from_static("cleanup-token"),
        )
        .json(&json!({"days": 7}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["scanned"], 0);
}

#[tokio::test]
async fn health_answers() {
    let backend = MockServer::start().await;
    let app = spawn_app(&backend, None);

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

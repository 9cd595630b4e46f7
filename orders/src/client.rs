//! Order backend REST client.

use crate::error::OrdersError;
use crate::types::{NewOrder, Order, OrderUpdate};
use booking_core::types::OrderId;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// REST client for the commerce order backend.
///
/// Authenticates with basic auth over the backend's consumer key pair.
#[derive(Clone)]
pub struct OrdersClient {
    http: Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl OrdersClient {
    /// Creates a client over the backend REST base URL (no trailing slash).
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, OrdersError> {
        let response = request
            .send()
            .await
            .map_err(|e| OrdersError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrdersError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OrdersError::Decode(e.to_string()))
    }

    /// Creates an order.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersError`] on transport failure, a non-success status or
    /// an undecodable response.
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, OrdersError> {
        self.execute(self.request(Method::POST, "/orders").json(order))
            .await
    }

    /// Applies a partial update to an order.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersError`] on transport failure, a non-success status or
    /// an undecodable response.
    pub async fn update_order(
        &self,
        order_id: OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, OrdersError> {
        self.execute(
            self.request(Method::PUT, &format!("/orders/{}", order_id.value()))
                .json(update),
        )
        .await
    }

    /// Fetches one order.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersError`] on transport failure, a non-success status or
    /// an undecodable response.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrdersError> {
        self.execute(self.request(Method::GET, &format!("/orders/{}", order_id.value())))
            .await
    }

    /// Lists orders filtered by status, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersError`] on transport failure, a non-success status or
    /// an undecodable response.
    pub async fn list_orders(&self, statuses: &[&str], per_page: u32) -> Result<Vec<Order>, OrdersError> {
        self.execute(self.request(Method::GET, "/orders").query(&[
            ("status", statuses.join(",").as_str()),
            ("per_page", per_page.to_string().as_str()),
            ("orderby", "date"),
            ("order", "asc"),
        ]))
        .await
    }

    /// Permanently deletes an order.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersError`] on transport failure, a non-success status or
    /// an undecodable response.
    pub async fn delete_order(&self, order_id: OrderId) -> Result<Order, OrdersError> {
        self.execute(
            self.request(Method::DELETE, &format!("/orders/{}", order_id.value()))
                .query(&[("force", "true")]),
        )
        .await
    }
}

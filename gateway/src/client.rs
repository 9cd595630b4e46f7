//! Hosted checkout session client.
//!
//! One bounded, single-attempt HTTP call per session. Retry policy, if any,
//! belongs to the caller.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::reference::format_reference;
use booking_core::types::OrderId;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Input for one hosted checkout session.
#[derive(Clone, Debug)]
pub struct SessionRequest {
    /// Order the session pays for.
    pub order_id: OrderId,
    /// Amount in minor currency units.
    pub amount_minor: u64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Customer email.
    pub customer_email: String,
    /// Customer phone, when known.
    pub customer_phone: Option<String>,
    /// Where the provider sends the customer back after payment.
    pub return_url: String,
    /// Webhook endpoint to register on the session, when configured.
    pub webhook_url: Option<String>,
}

/// A created hosted checkout session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostedSession {
    /// Fully qualified URL to redirect the customer to.
    pub redirect_url: String,
    /// Provider session id, recorded on the order.
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "hostedCheckoutId")]
    hosted_checkout_id: Option<String>,
    #[serde(rename = "redirectUrl")]
    redirect_url: Option<String>,
    #[serde(rename = "partialRedirectUrl")]
    partial_redirect_url: Option<String>,
}

/// Client for the provider's hosted checkout API.
#[derive(Clone)]
pub struct HostedCheckoutClient {
    http: Client,
    config: GatewayConfig,
    base_url: String,
}

impl HostedCheckoutClient {
    /// Creates a client over the resolved config.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let base_url = config.base_url();
        Self {
            http: Client::new(),
            config,
            base_url,
        }
    }

    /// Overrides the provider base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The config this client was built from.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Creates a hosted checkout session for an order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] with the raw provider body on a
    /// non-success status, [`GatewayError::Transport`] on network failure
    /// and [`GatewayError::Decode`] when the response carries no redirect
    /// URL at all.
    pub async fn create_hosted_session(
        &self,
        request: &SessionRequest,
    ) -> Result<HostedSession, GatewayError> {
        let mut payload = json!({
            "order": {
                "amountOfMoney": {
                    "currencyCode": request.currency,
                    "amount": request.amount_minor,
                },
                "customer": {
                    "contactDetails": {
                        "emailAddress": request.customer_email,
                        "phoneNumber": request.customer_phone,
                    },
                    "billingAddress": { "countryCode": "FR" },
                },
                "references": {
                    "merchantReference": format_reference(request.order_id),
                },
            },
            "hostedCheckoutSpecificInput": {
                "locale": "fr_FR",
                "returnUrl": request.return_url,
            },
        });
        if let Some(webhook_url) = &request.webhook_url {
            payload["feedbacks"] = json!({ "webhooksUrls": [webhook_url] });
        }

        let url = format!(
            "{}/v2/{}/hostedcheckouts",
            self.base_url, self.config.merchant_id
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.api_key_id, Some(&self.config.api_secret))
            .header("x-integrator", &self.config.integrator)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                order_id = request.order_id.value(),
                status = status.as_u16(),
                "hosted checkout session rejected"
            );
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let redirect_url = session
            .redirect_url
            .or_else(|| {
                session
                    .partial_redirect_url
                    .map(|partial| format!("https://payment.{partial}"))
            })
            .ok_or_else(|| {
                GatewayError::Decode("session response carries no redirect URL".to_string())
            })?;

        Ok(HostedSession {
            redirect_url,
            session_id: session.hosted_checkout_id.unwrap_or_default(),
        })
    }
}

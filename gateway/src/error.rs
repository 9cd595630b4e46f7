//! Gateway error taxonomy.

use thiserror::Error;

/// Errors from the hosted-payment-provider adapter.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required credentials or configuration are absent.
    #[error("gateway configuration error: {0}")]
    Config(String),

    /// The provider declined the request. The raw response body is retained
    /// for diagnostics.
    #[error("provider rejected the request (status {status}): {body}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Raw provider response body.
        body: String,
    },

    /// Network-level failure talking to the provider.
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// Webhook signature does not match the body.
    #[error("webhook signature verification failed")]
    SignatureInvalid,

    /// Webhook referenced a key id we hold no secret for.
    #[error("unknown webhook key id: {0}")]
    UnknownWebhookKey(String),

    /// Provider payload could not be decoded.
    #[error("failed to decode provider payload: {0}")]
    Decode(String),
}

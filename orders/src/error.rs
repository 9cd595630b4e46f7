//! Order backend error type.

use thiserror::Error;

/// Errors from the order backend client.
#[derive(Debug, Error)]
pub enum OrdersError {
    /// Client misconfiguration (missing base URL or credentials).
    #[error("order backend configuration error: {0}")]
    Config(String),

    /// Network-level failure.
    #[error("order backend transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("order backend returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The backend response could not be decoded.
    #[error("failed to decode order backend response: {0}")]
    Decode(String),
}

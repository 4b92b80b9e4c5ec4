//! Webhook payload errors.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised while authenticating or decoding a channel webhook.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookPayloadError {
    /// `X-Hub-Signature-256` did not match the body.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A signature was required but not sent.
    #[error("Missing signature")]
    MissingSignature,

    /// The subscription handshake used a wrong mode or token.
    #[error("Subscription handshake rejected")]
    HandshakeRejected,

    /// The body could not be decoded.
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl WebhookPayloadError {
    /// Maps the error to the HTTP status returned to the provider.
    ///
    /// Malformed payloads are acknowledged with 200 so providers do not keep
    /// redelivering something that will never parse.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookPayloadError::InvalidSignature | WebhookPayloadError::MissingSignature => {
                StatusCode::UNAUTHORIZED
            }
            WebhookPayloadError::HandshakeRejected => StatusCode::FORBIDDEN,
            WebhookPayloadError::Malformed(_) => StatusCode::OK,
        }
    }
}

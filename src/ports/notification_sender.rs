//! Notification Sender Port - Delivers text to a user through the messaging channel.

use async_trait::async_trait;

use crate::domain::foundation::UserId;

/// Delivery errors. Callers log these; sends are never retried.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("channel rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("channel authentication failed")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    Network(String),

    #[error("delivery timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

/// Port for outbound chat messages.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send `text` to `user_id`.
    async fn send(&self, user_id: &UserId, text: &str) -> Result<(), DeliveryError>;
}

/// Outcome of a send once the error has been absorbed.
///
/// The conversation engine converts every [`DeliveryError`] into
/// `Delivery::Failed` after logging it, so failed sends never change the
/// turn's result or the webhook acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

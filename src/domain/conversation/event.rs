//! Canonical inbound events and the engine's acknowledgment.

use serde::{Deserialize, Serialize};

/// Kind of an inbound channel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Plain text message.
    Text,
    /// Image message; `media_ref` carries the provider handle.
    Image,
    /// Delivery/read receipt or other provider status ping.
    Status,
    /// Anything else (audio, stickers, locations, ...).
    Unknown,
}

/// One webhook delivery, normalized by a webhook adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Sender identifier; empty for provider pings.
    pub user_id: String,
    pub kind: EventKind,
    /// Message body, or the caption for images.
    pub text: Option<String>,
    /// Opaque media handle (URL or provider media id).
    pub media_ref: Option<String>,
}

impl InboundEvent {
    /// Creates a text event.
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            kind: EventKind::Text,
            text: Some(text.into()),
            media_ref: None,
        }
    }

    /// Creates an image event.
    pub fn image(user_id: impl Into<String>, media_ref: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            kind: EventKind::Image,
            text: None,
            media_ref: Some(media_ref.into()),
        }
    }

    /// Creates a status event.
    pub fn status(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            kind: EventKind::Status,
            text: None,
            media_ref: None,
        }
    }

    /// Creates an event of a kind the engine does not understand.
    pub fn unknown(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            kind: EventKind::Unknown,
            text: None,
            media_ref: None,
        }
    }

    /// Attaches a caption/body.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Trimmed body, `None` when absent or blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Acknowledgment returned to the webhook adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckResult {
    /// Event was routed to a conversation (downstream failures included).
    Accepted,
    /// Event was dropped without side effects.
    Ignored,
}

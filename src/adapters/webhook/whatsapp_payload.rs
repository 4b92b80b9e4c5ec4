//! WhatsApp Cloud API webhook payloads.
//!
//! One delivery can batch several messages and status updates across
//! `entry[].changes[].value`. Each becomes one inbound event, in payload order.

use serde::Deserialize;

use super::WebhookPayloadError;
use crate::domain::conversation::InboundEvent;

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<CloudMessage>,
    #[serde(default)]
    statuses: Vec<CloudStatus>,
}

#[derive(Debug, Deserialize)]
struct CloudMessage {
    #[serde(default)]
    from: String,
    #[serde(rename = "type", default)]
    kind: String,
    text: Option<CloudText>,
    image: Option<CloudImage>,
}

#[derive(Debug, Deserialize)]
struct CloudText {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct CloudImage {
    id: String,
    caption: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloudStatus {
    #[serde(default)]
    recipient_id: String,
}

impl CloudMessage {
    fn into_event(self) -> InboundEvent {
        let user_id = self.from.trim().to_string();
        match (self.kind.as_str(), self.text, self.image) {
            ("text", Some(text), _) => InboundEvent::text(user_id, text.body),
            ("text", None, _) => InboundEvent::text(user_id, ""),
            ("image", _, Some(image)) => {
                let event = InboundEvent::image(user_id, image.id);
                match image.caption.filter(|c| !c.trim().is_empty()) {
                    Some(caption) => event.with_text(caption),
                    None => event,
                }
            }
            _ => InboundEvent::unknown(user_id),
        }
    }
}

/// Decodes a webhook body into events.
///
/// # Errors
///
/// Returns `Malformed` when the body is not a JSON webhook envelope.
pub fn parse_whatsapp_payload(body: &[u8]) -> Result<Vec<InboundEvent>, WebhookPayloadError> {
    let envelope: WebhookEnvelope = serde_json::from_slice(body)
        .map_err(|e| WebhookPayloadError::Malformed(e.to_string()))?;

    let events = envelope
        .entry
        .into_iter()
        .flat_map(|entry| entry.changes)
        .flat_map(|change| {
            let ChangeValue { messages, statuses } = change.value;
            messages
                .into_iter()
                .map(CloudMessage::into_event)
                .chain(
                    statuses
                        .into_iter()
                        .map(|status| InboundEvent::status(status.recipient_id)),
                )
        })
        .collect();

    Ok(events)
}

/// Query parameters of the `GET` verification handshake.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionChallenge {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl SubscriptionChallenge {
    /// Returns the challenge to echo if mode and token match.
    pub fn accept(self, expected_token: &str) -> Result<String, WebhookPayloadError> {
        let token_matches = !expected_token.is_empty()
            && self.verify_token.as_deref() == Some(expected_token);

        match (self.mode.as_deref(), self.challenge) {
            (Some("subscribe"), Some(challenge)) if token_matches && !challenge.is_empty() => {
                Ok(challenge)
            }
            _ => Err(WebhookPayloadError::HandshakeRejected),
        }
    }
}

//! Twilio WhatsApp webhook payloads.
//!
//! Twilio posts `application/x-www-form-urlencoded` bodies for both inbound
//! messages and status callbacks. Only the first media item is used.

use serde::Deserialize;

use crate::domain::conversation::InboundEvent;

/// Empty TwiML document. Replies go out through the Messages API instead.
pub const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response/>"#;

/// Fields of a Twilio webhook form the bot reads. Everything is optional so
/// that unexpected shapes still decode and get normalized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioInboundForm {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "NumMedia")]
    pub num_media: Option<String>,
    #[serde(rename = "MediaUrl0")]
    pub media_url0: Option<String>,
    #[serde(rename = "MediaContentType0")]
    pub media_content_type0: Option<String>,
    #[serde(rename = "MessageStatus")]
    pub message_status: Option<String>,
}

impl TwilioInboundForm {
    fn media_count(&self) -> usize {
        self.num_media
            .as_deref()
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(0)
    }

    fn media_url(&self) -> Option<&str> {
        self.media_url0
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Normalizes the form into an inbound event.
    pub fn into_event(self) -> InboundEvent {
        let user_id = self.from.clone().unwrap_or_default().trim().to_string();

        // Status callbacks can echo the original Body; they never start a turn.
        let is_status = self
            .message_status
            .as_deref()
            .is_some_and(|status| !status.trim().is_empty());
        if is_status {
            return InboundEvent::status(user_id);
        }

        if let Some(url) = self.media_url() {
            let is_image = self
                .media_content_type0
                .as_deref()
                .map_or(true, |mime| mime.trim().to_ascii_lowercase().starts_with("image/"));
            if !is_image {
                return with_body(InboundEvent::unknown(user_id), self.body);
            }
            return with_body(InboundEvent::image(user_id, url), self.body);
        }

        if self.media_count() > 0 {
            return with_body(InboundEvent::unknown(user_id), self.body);
        }

        match self.body {
            Some(body) => InboundEvent::text(user_id, body),
            None => InboundEvent::unknown(user_id),
        }
    }
}

fn with_body(event: InboundEvent, body: Option<String>) -> InboundEvent {
    match body {
        Some(body) if !body.trim().is_empty() => event.with_text(body),
        _ => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::EventKind;

    const FROM: &str = "whatsapp:+5491100000000";

    fn form() -> TwilioInboundForm {
        TwilioInboundForm {
            from: Some(FROM.to_string()),
            ..TwilioInboundForm::default()
        }
    }

    #[test]
    fn text_message_becomes_text_event() {
        let event = TwilioInboundForm {
            body: Some("¿Puedo comer palta?".to_string()),
            num_media: Some("0".to_string()),
            ..form()
        }
        .into_event();

        assert_eq!(event, InboundEvent::text(FROM, "¿Puedo comer palta?"));
    }

    #[test]
    fn empty_body_stays_a_text_event() {
        let event = TwilioInboundForm {
            body: Some(String::new()),
            ..form()
        }
        .into_event();

        assert_eq!(event.kind, EventKind::Text);
        assert_eq!(event.trimmed_text(), None);
    }

    #[test]
    fn image_uses_first_media_url_and_caption() {
        let event = TwilioInboundForm {
            body: Some("pan".to_string()),
            num_media: Some("1".to_string()),
            media_url0: Some("https://api.twilio.com/media/ME1".to_string()),
            media_content_type0: Some("image/jpeg".to_string()),
            ..form()
        }
        .into_event();

        assert_eq!(event.kind, EventKind::Image);
        assert_eq!(event.media_ref.as_deref(), Some("https://api.twilio.com/media/ME1"));
        assert_eq!(event.text.as_deref(), Some("pan"));
    }

    #[test]
    fn image_with_blank_body_has_no_caption() {
        let event = TwilioInboundForm {
            body: Some(String::new()),
            num_media: Some("1".to_string()),
            media_url0: Some("https://api.twilio.com/media/ME1".to_string()),
            ..form()
        }
        .into_event();

        assert_eq!(event.kind, EventKind::Image);
        assert_eq!(event.text, None);
    }

    #[test]
    fn non_image_media_is_unknown() {
        let event = TwilioInboundForm {
            num_media: Some("1".to_string()),
            media_url0: Some("https://api.twilio.com/media/ME2".to_string()),
            media_content_type0: Some("audio/ogg".to_string()),
            ..form()
        }
        .into_event();

        assert_eq!(event.kind, EventKind::Unknown);
    }

    #[test]
    fn status_callback_becomes_status_event() {
        let event = TwilioInboundForm {
            message_status: Some("delivered".to_string()),
            ..form()
        }
        .into_event();

        assert_eq!(event, InboundEvent::status(FROM));
    }

    #[test]
    fn status_callback_echoing_body_is_still_status() {
        let event = TwilioInboundForm {
            body: Some("hola".to_string()),
            message_status: Some("read".to_string()),
            ..form()
        }
        .into_event();

        assert_eq!(event, InboundEvent::status(FROM));
    }

    #[test]
    fn blank_status_does_not_mask_text() {
        let event = TwilioInboundForm {
            body: Some("hola".to_string()),
            message_status: Some("  ".to_string()),
            ..form()
        }
        .into_event();

        assert_eq!(event, InboundEvent::text(FROM, "hola"));
    }

    #[test]
    fn missing_sender_yields_empty_user_id() {
        let event = TwilioInboundForm {
            body: Some("hola".to_string()),
            ..TwilioInboundForm::default()
        }
        .into_event();

        assert_eq!(event.user_id, "");
    }

    #[test]
    fn empty_twiml_is_a_response_document() {
        assert!(EMPTY_TWIML.ends_with("<Response/>"));
    }
}

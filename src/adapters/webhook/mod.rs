//! Channel webhook adapters.
//!
//! Normalize provider-specific payloads into `InboundEvent`s and
//! authenticate deliveries.

mod errors;
mod signature;
mod twilio_payload;
mod whatsapp_payload;

pub use errors::WebhookPayloadError;
pub use signature::{SignatureVerifier, SIGNATURE_HEADER};
pub use twilio_payload::{TwilioInboundForm, EMPTY_TWIML};
pub use whatsapp_payload::{parse_whatsapp_payload, SubscriptionChallenge};

//! Messaging channel adapters.
//!
//! - `twilio` - Twilio WhatsApp sender and pass-through media URLs
//! - `whatsapp_cloud` - Meta Graph API sender and inline media resolver
//! - `mock` - Recording sender and table-driven resolver for tests

mod mock;
mod twilio;
mod whatsapp_cloud;

use std::time::Duration;

use crate::ports::DeliveryError;

pub use mock::{RecordingNotificationSender, SentMessage, StaticMediaResolver};
pub use twilio::{PassthroughMediaResolver, TwilioConfig, TwilioNotificationSender};
pub use whatsapp_cloud::{
    data_url, WhatsAppCloudConfig, WhatsAppCloudMediaResolver, WhatsAppCloudNotificationSender,
    DEFAULT_MAX_MEDIA_BYTES,
};

/// Maps a transport failure to a delivery error.
fn delivery_error(err: reqwest::Error, timeout: Duration) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout {
            timeout_secs: timeout.as_secs() as u32,
        }
    } else {
        DeliveryError::Network(err.to_string())
    }
}

//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Completion providers (OpenAI, mock)
//! - `storage` - Session stores
//! - `messaging` - Outbound senders and media resolvers per channel
//! - `webhook` - Inbound payload parsing and signature checks
//! - `http` - Axum routes serving the webhooks

pub mod ai;
pub mod http;
pub mod messaging;
pub mod storage;
pub mod webhook;

pub use ai::{MockAIProvider, MockError, MockResponse, OpenAIConfig, OpenAIProvider};
pub use messaging::{
    PassthroughMediaResolver, RecordingNotificationSender, SentMessage, StaticMediaResolver,
    TwilioConfig, TwilioNotificationSender, WhatsAppCloudConfig, WhatsAppCloudMediaResolver,
    WhatsAppCloudNotificationSender,
};
pub use storage::InMemorySessionStore;
pub use webhook::{SignatureVerifier, WebhookPayloadError};

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the conversation engine and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Completion service answering food queries
//! - `MediaResolver` - Inbound image handle to readable locator
//! - `NotificationSender` - Outbound chat messages
//! - `SessionStore` - Per-user conversation state

mod ai_provider;
mod media_resolver;
mod notification_sender;
mod session_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, ContentPart, FinishReason,
    Message, MessageContent, MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use media_resolver::{MediaError, MediaResolver, ResolvedMedia};
pub use notification_sender::{Delivery, DeliveryError, NotificationSender};
pub use session_store::{SessionStore, SessionStoreError};

//! Conversation handlers.
//!
//! - `ConversationEngine` - runs one turn per inbound event
//! - `EvictIdleSessionsHandler` - periodic idle-session cleanup
//! - `UserLocks` - per-user turn serialization

mod evict_idle_sessions;
mod handle_inbound_event;
mod user_locks;

pub use evict_idle_sessions::EvictIdleSessionsHandler;
pub use handle_inbound_event::{
    ConversationEngine, EngineConfig, TurnError, TurnOutcome, UpstreamError,
};
pub use user_locks::UserLocks;

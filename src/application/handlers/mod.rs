//! Application handlers.
//!
//! Handlers that orchestrate domain operations over the ports.

pub mod conversation;

pub use conversation::{
    ConversationEngine, EngineConfig, EvictIdleSessionsHandler, TurnError, TurnOutcome,
    UpstreamError, UserLocks,
};

//! Application layer - Turn handling and dispatch.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod dispatcher;
pub mod handlers;

pub use dispatcher::TurnDispatcher;
pub use handlers::{
    ConversationEngine, EngineConfig, EvictIdleSessionsHandler, TurnError, TurnOutcome,
    UpstreamError, UserLocks,
};

//! Conversation domain module.
//!
//! The per-user dialogue: collect the diet, answer food queries,
//! offer another query, close. Pure types and rules only; the engine in
//! `application` performs the I/O.

mod event;
pub mod messages;
mod prompt;
mod reply;
mod session;
mod state;
mod transitions;

pub use event::{AckResult, EventKind, InboundEvent};
pub use prompt::{system_instruction, Prompt, UserContent, FALLBACK_DIET};
pub use reply::FollowupAnswer;
pub use session::Session;
pub use state::ConversationState;
pub use transitions::{transition, NextState, Transition, TurnAction};

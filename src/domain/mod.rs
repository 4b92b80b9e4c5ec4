//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors, state machine trait)
//! - `conversation` - Session, inbound events, transition table and prompts

pub mod conversation;
pub mod foundation;

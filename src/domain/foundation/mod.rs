//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, error types and the state machine trait
//! that form the vocabulary of the nutribot domain.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{TurnId, UserId};
pub use state_machine::StateMachine;

//! Conversation state machine.
//!
//! Defines the lifecycle states of a user's conversation and valid transitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// The lifecycle state of a conversation.
///
/// Conversations move through these states:
/// - `Initial`: Session just created, nothing sent yet
/// - `AwaitingDiet`: Greeting sent, waiting for the user's diet
/// - `AwaitingQuery`: Diet known, waiting for a food question or photo
/// - `AwaitingFollowup`: Answer sent, waiting for yes/no on another query
///
/// Ending the conversation deletes the session instead of moving to a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Session created lazily on the first inbound event.
    #[default]
    Initial,

    /// Waiting for the diet preference.
    AwaitingDiet,

    /// Waiting for a query (text or image).
    AwaitingQuery,

    /// Waiting for "another query?" confirmation.
    AwaitingFollowup,
}

impl ConversationState {
    /// Every state, in flow order.
    pub const ALL: [ConversationState; 4] = [
        ConversationState::Initial,
        ConversationState::AwaitingDiet,
        ConversationState::AwaitingQuery,
        ConversationState::AwaitingFollowup,
    ];

    /// Stable wire name, as stored by session stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::AwaitingDiet => "awaiting_diet",
            Self::AwaitingQuery => "awaiting_query",
            Self::AwaitingFollowup => "awaiting_followup",
        }
    }

    /// Returns true if a turn in this state may call the completion service.
    pub fn can_query_ai(&self) -> bool {
        matches!(self, Self::AwaitingQuery)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("state", format!("unknown value '{}'", s))
            })
    }
}

impl StateMachine for ConversationState {
    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationState::*;
        match self {
            Initial => vec![AwaitingDiet],
            // Self-edges are re-prompts.
            AwaitingDiet => vec![AwaitingDiet, AwaitingQuery],
            AwaitingQuery => vec![AwaitingQuery, AwaitingFollowup],
            AwaitingFollowup => vec![AwaitingFollowup, AwaitingQuery],
        }
    }
}

//! Per-user conversation session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConversationState;
use crate::domain::foundation::{StateMachine, UserId, ValidationError};

/// Conversation state for one user.
///
/// Created lazily in [`ConversationState::Initial`] on the user's first
/// inbound event and removed when the user ends the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user_id: UserId,
    state: ConversationState,
    diet: Option<String>,
    last_activity: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh session in the initial state.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: ConversationState::Initial,
            diet: None,
            last_activity: Utc::now(),
        }
    }

    /// Rebuilds a session from stored parts.
    pub fn restore(
        user_id: UserId,
        state: ConversationState,
        diet: Option<String>,
        last_activity: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            state,
            diet: diet.filter(|d| !d.trim().is_empty()),
            last_activity,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// The recorded diet, if any.
    pub fn diet(&self) -> Option<&str> {
        self.diet.as_deref()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Records the diet preference. Blank input is rejected.
    pub fn set_diet(&mut self, diet: &str) -> Result<(), ValidationError> {
        let diet = diet.trim();
        if diet.is_empty() {
            return Err(ValidationError::empty_field("diet"));
        }
        self.diet = Some(diet.to_string());
        Ok(())
    }

    /// Moves to `target` if the edge is legal and refreshes `last_activity`.
    pub fn advance(&mut self, target: ConversationState) -> Result<(), ValidationError> {
        self.state = self.state.transition_to(target)?;
        self.touch();
        Ok(())
    }

    /// Refreshes `last_activity` without changing state.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("whatsapp:+5491100000000").unwrap()
    }

    #[test]
    fn new_session_starts_initial_without_diet() {
        let session = Session::new(user());
        assert_eq!(session.state(), ConversationState::Initial);
        assert_eq!(session.diet(), None);
    }

    #[test]
    fn set_diet_trims_input() {
        let mut session = Session::new(user());
        session.set_diet("  vegana ").unwrap();
        assert_eq!(session.diet(), Some("vegana"));
    }

    #[test]
    fn set_diet_rejects_blank() {
        let mut session = Session::new(user());
        assert!(session.set_diet(" \t").is_err());
        assert_eq!(session.diet(), None);
    }

    #[test]
    fn advance_follows_state_machine() {
        let mut session = Session::new(user());
        session.advance(ConversationState::AwaitingDiet).unwrap();
        assert_eq!(session.state(), ConversationState::AwaitingDiet);
    }

    #[test]
    fn advance_rejects_illegal_edge_and_keeps_state() {
        let mut session = Session::new(user());
        assert!(session.advance(ConversationState::AwaitingFollowup).is_err());
        assert_eq!(session.state(), ConversationState::Initial);
    }

    #[test]
    fn restore_drops_blank_diet() {
        let session = Session::restore(
            user(),
            ConversationState::AwaitingQuery,
            Some("   ".to_string()),
            Utc::now(),
        );
        assert_eq!(session.diet(), None);
    }
}

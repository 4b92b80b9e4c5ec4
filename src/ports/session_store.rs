//! Session Store Port - Interface for per-user conversation state.
//!
//! Stores are keyed by [`UserId`]. A `get` after a `put` for the same key must
//! observe the written value. The engine serializes turns per user, so the
//! store only needs per-key atomic operations.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::conversation::Session;
use crate::domain::foundation::UserId;

/// Errors that can occur during session store operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// The stored state value is not a known conversation state.
    #[error("Unknown conversation state '{state}' stored for user {user_id}")]
    UnknownState { user_id: UserId, state: String },

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Port for reading and writing conversation sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for a user, if one exists.
    ///
    /// # Errors
    /// Returns `SessionStoreError::UnknownState` if the stored state cannot be decoded
    async fn get(&self, user_id: &UserId) -> Result<Option<Session>, SessionStoreError>;

    /// Insert or replace the session for `session.user_id()`.
    async fn put(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Remove the session for a user. Removing a missing session is not an error.
    async fn delete(&self, user_id: &UserId) -> Result<(), SessionStoreError>;

    /// Remove sessions idle for longer than `max_idle`.
    ///
    /// # Returns
    /// The number of sessions removed
    async fn evict_idle(&self, max_idle: Duration) -> Result<usize, SessionStoreError>;
}

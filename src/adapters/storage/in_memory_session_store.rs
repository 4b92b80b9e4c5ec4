//! In-Memory Session Store Adapter
//!
//! Keeps conversation sessions in a process-local map. Sessions live for the
//! process lifetime unless deleted or evicted for inactivity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::conversation::{ConversationState, Session};
use crate::domain::foundation::UserId;
use crate::ports::{SessionStore, SessionStoreError};

/// Stored form of a session. The state is kept by wire name so records
/// written by an older build can still be read back and rejected.
#[derive(Debug, Clone)]
struct StoredSession {
    state: String,
    diet: Option<String>,
    last_activity: DateTime<Utc>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            state: session.state().as_str().to_string(),
            diet: session.diet().map(str::to_string),
            last_activity: session.last_activity(),
        }
    }
}

/// In-memory storage for conversation sessions
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<UserId, StoredSession>>>,
}

impl InMemorySessionStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a record with an arbitrary state value, bypassing validation.
    ///
    /// Used to exercise recovery from stale or corrupted records.
    pub async fn put_raw(&self, user_id: &UserId, state: &str, diet: Option<&str>) {
        self.sessions.write().await.insert(
            user_id.clone(),
            StoredSession {
                state: state.to_string(),
                diet: diet.map(str::to_string),
                last_activity: Utc::now(),
            },
        );
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Get the number of stored sessions
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<Session>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        let Some(stored) = sessions.get(user_id) else {
            return Ok(None);
        };

        let state: ConversationState =
            stored
                .state
                .parse()
                .map_err(|_| SessionStoreError::UnknownState {
                    user_id: user_id.clone(),
                    state: stored.state.clone(),
                })?;

        Ok(Some(Session::restore(
            user_id.clone(),
            state,
            stored.diet.clone(),
            stored.last_activity,
        )))
    }

    async fn put(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(session.user_id().clone(), StoredSession::from(session));
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(user_id);
        Ok(())
    }

    async fn evict_idle(&self, max_idle: Duration) -> Result<usize, SessionStoreError> {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return Ok(0);
        };
        let Some(cutoff) = Utc::now().checked_sub_signed(max_idle) else {
            return Ok(0);
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.last_activity >= cutoff);
        Ok(before - sessions.len())
    }
}

//! EvictIdleSessionsHandler - Drops sessions nobody has touched in a while.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::ports::{SessionStore, SessionStoreError};

/// Removes sessions idle for longer than the configured TTL.
pub struct EvictIdleSessionsHandler {
    sessions: Arc<dyn SessionStore>,
    max_idle: Duration,
}

impl EvictIdleSessionsHandler {
    pub fn new(sessions: Arc<dyn SessionStore>, max_idle: Duration) -> Self {
        Self { sessions, max_idle }
    }

    /// Runs one eviction pass and returns how many sessions were removed.
    pub async fn handle(&self) -> Result<usize, SessionStoreError> {
        let evicted = self.sessions.evict_idle(self.max_idle).await?;
        if evicted > 0 {
            tracing::info!(
                evicted,
                max_idle_secs = self.max_idle.as_secs(),
                "Evicted idle sessions"
            );
        }
        Ok(evicted)
    }

    /// Runs `handle` every `interval` until the task is aborted.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = self.handle().await {
                    tracing::warn!(error = %err, "Idle session sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemorySessionStore;
    use crate::domain::conversation::{ConversationState, Session};
    use crate::domain::foundation::UserId;
    use chrono::Utc;

    fn stale_session(id: &str) -> Session {
        Session::restore(
            UserId::new(id).unwrap(),
            ConversationState::AwaitingQuery,
            None,
            Utc::now() - chrono::Duration::days(2),
        )
    }

    #[tokio::test]
    async fn handle_evicts_stale_sessions() {
        let store = InMemorySessionStore::new();
        store.put(&stale_session("a")).await.unwrap();
        store
            .put(&Session::new(UserId::new("b").unwrap()))
            .await
            .unwrap();

        let handler =
            EvictIdleSessionsHandler::new(Arc::new(store.clone()), Duration::from_secs(86_400));

        assert_eq!(handler.handle().await.unwrap(), 1);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn spawned_sweeper_runs_on_interval() {
        let store = InMemorySessionStore::new();
        store.put(&stale_session("a")).await.unwrap();

        let task = EvictIdleSessionsHandler::new(Arc::new(store.clone()), Duration::from_secs(60))
            .spawn(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        assert_eq!(store.count().await, 0);
    }
}

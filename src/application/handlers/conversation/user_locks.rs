//! Per-user turn locks.
//!
//! Each user id maps to its own `tokio::sync::Mutex`. Tokio mutexes are fair,
//! so waiters acquire in arrival order and a user's turns run in delivery order.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::UserId;

/// Keyed lock table.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the user's lock. The turn runs while the guard is alive.
    pub async fn acquire(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(user_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops the user's entry when no turn holds or awaits it.
    ///
    /// Clones are only taken under the table lock, so a strong count of one
    /// means the table holds the last reference.
    pub async fn release(&self, user_id: &UserId) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(user_id);
        }
    }

    /// Number of users with a live lock entry.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

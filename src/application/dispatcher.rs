//! TurnDispatcher - Hands inbound events to per-user worker tasks.
//!
//! Webhooks must be acknowledged quickly, long before a completion returns.
//! The dispatcher enqueues each event on its user's channel and returns at
//! once. One worker per active user drains the channel in order; a worker
//! that stays idle for `idle_timeout` exits, and the next event for that user
//! starts a new one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::handlers::ConversationEngine;
use crate::domain::conversation::{AckResult, InboundEvent};
use crate::domain::foundation::UserId;

type WorkerTable = HashMap<UserId, UnboundedSender<InboundEvent>>;

/// Routes events to per-user workers.
#[derive(Clone)]
pub struct TurnDispatcher {
    engine: Arc<ConversationEngine>,
    workers: Arc<Mutex<WorkerTable>>,
    idle_timeout: Duration,
}

impl TurnDispatcher {
    pub fn new(engine: Arc<ConversationEngine>, idle_timeout: Duration) -> Self {
        Self {
            engine,
            workers: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Enqueues an event for processing.
    ///
    /// Returns `Ignored` for events the engine would drop, without spawning
    /// anything. Enqueue order is processing order for each user.
    pub fn dispatch(&self, event: InboundEvent) -> AckResult {
        let Some(user_id) = ConversationEngine::route(&event) else {
            tracing::debug!(kind = ?event.kind, "Dropping unroutable event");
            return AckResult::Ignored;
        };

        let mut workers = lock(&self.workers);
        let event = match workers.get(&user_id) {
            Some(tx) => match tx.send(event) {
                Ok(()) => return AckResult::Accepted,
                // The worker died; start a fresh one with the same event.
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(event).is_err() {
            return AckResult::Ignored;
        }
        workers.insert(user_id.clone(), tx);
        drop(workers);

        tokio::spawn(run_worker(
            user_id,
            rx,
            self.engine.clone(),
            self.workers.clone(),
            self.idle_timeout,
        ));
        AckResult::Accepted
    }

    /// Number of live workers.
    pub fn active_workers(&self) -> usize {
        lock(&self.workers).len()
    }
}

fn lock(workers: &Mutex<WorkerTable>) -> MutexGuard<'_, WorkerTable> {
    workers.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_worker(
    user_id: UserId,
    mut rx: UnboundedReceiver<InboundEvent>,
    engine: Arc<ConversationEngine>,
    workers: Arc<Mutex<WorkerTable>>,
    idle_timeout: Duration,
) {
    tracing::debug!(user_id = %user_id, "Turn worker started");
    loop {
        let event = match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(_) => {
                // Senders only enqueue under the table lock, so an empty
                // queue here means nothing can be lost by unregistering.
                let mut table = lock(&workers);
                match rx.try_recv() {
                    Ok(event) => {
                        drop(table);
                        event
                    }
                    Err(_) => {
                        table.remove(&user_id);
                        break;
                    }
                }
            }
        };
        engine.handle(event).await;
    }
    tracing::debug!(user_id = %user_id, "Turn worker stopped");
}

//! In-process messaging doubles for tests and local runs.
//!
//! `RecordingNotificationSender` keeps every outbound message instead of
//! delivering it; `StaticMediaResolver` answers from a fixed table.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::UserId;
use crate::ports::{
    DeliveryError, MediaError, MediaResolver, NotificationSender, ResolvedMedia,
};

/// A message captured by [`RecordingNotificationSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub user_id: UserId,
    pub text: String,
}

/// Notification sender that records sends.
///
/// Failed sends are recorded too, so tests can count attempts.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<AtomicBool>,
    delay: Duration,
}

impl RecordingNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sender whose every send fails.
    pub fn failing() -> Self {
        let sender = Self::new();
        sender.set_failing(true);
        sender
    }

    /// Sets simulated latency per send. The message is recorded before the wait.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Toggles failure injection.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All recorded messages, oldest first.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts sent to one user, oldest first.
    pub fn texts_for(&self, user_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id.as_str() == user_id)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send(&self, user_id: &UserId, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(SentMessage {
            user_id: user_id.clone(),
            text: text.to_string(),
        });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected {
                status: 503,
                body: "recording sender configured to fail".to_string(),
            });
        }
        Ok(())
    }
}

/// Media resolver backed by a fixed table.
///
/// Unknown handles resolve to `https://media.example/{media_ref}` unless the
/// resolver is failing.
#[derive(Debug, Clone, Default)]
pub struct StaticMediaResolver {
    entries: Arc<Mutex<HashMap<String, ResolvedMedia>>>,
    calls: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
    delay: Duration,
}

impl StaticMediaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver whose every call fails.
    pub fn failing() -> Self {
        let resolver = Self::new();
        resolver.failing.store(true, Ordering::SeqCst);
        resolver
    }

    /// Maps `media_ref` to a fixed result.
    pub fn with_entry(self, media_ref: impl Into<String>, media: ResolvedMedia) -> Self {
        self.entries.lock().unwrap().insert(media_ref.into(), media);
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Media refs passed to `resolve`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaResolver for StaticMediaResolver {
    async fn resolve(&self, media_ref: &str) -> Result<ResolvedMedia, MediaError> {
        self.calls.lock().unwrap().push(media_ref.to_string());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(MediaError::Provider("static resolver configured to fail".to_string()));
        }

        let entry = self.entries.lock().unwrap().get(media_ref).cloned();
        Ok(entry.unwrap_or_else(|| {
            ResolvedMedia::url(format!("https://media.example/{}", media_ref))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn recording_sender_keeps_messages_in_order() {
        let sender = RecordingNotificationSender::new();
        sender.send(&user("a"), "uno").await.unwrap();
        sender.send(&user("b"), "dos").await.unwrap();
        sender.send(&user("a"), "tres").await.unwrap();

        assert_eq!(sender.count(), 3);
        assert_eq!(sender.texts_for("a"), vec!["uno", "tres"]);
    }

    #[tokio::test]
    async fn failing_sender_records_and_errors() {
        let sender = RecordingNotificationSender::failing();
        let result = sender.send(&user("a"), "hola").await;

        assert!(matches!(result, Err(DeliveryError::Rejected { status: 503, .. })));
        assert_eq!(sender.count(), 1);

        sender.set_failing(false);
        assert!(sender.send(&user("a"), "hola").await.is_ok());
    }

    #[tokio::test]
    async fn delayed_sender_records_before_waiting() {
        let sender = RecordingNotificationSender::new().with_delay(Duration::from_millis(200));
        let result =
            tokio::time::timeout(Duration::from_millis(20), sender.send(&user("a"), "hola")).await;

        assert!(result.is_err());
        assert_eq!(sender.texts_for("a"), vec!["hola"]);
    }

    #[tokio::test]
    async fn static_resolver_uses_table_then_default() {
        let resolver = StaticMediaResolver::new().with_entry(
            "m1",
            ResolvedMedia::url("data:image/png;base64,AAAA").with_mime_type("image/png"),
        );

        let known = resolver.resolve("m1").await.unwrap();
        let unknown = resolver.resolve("m2").await.unwrap();

        assert_eq!(known.url, "data:image/png;base64,AAAA");
        assert_eq!(unknown.url, "https://media.example/m2");
        assert_eq!(resolver.calls(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn failing_resolver_tracks_calls() {
        let resolver = StaticMediaResolver::failing();
        assert!(resolver.resolve("m1").await.is_err());
        assert_eq!(resolver.call_count(), 1);
    }
}

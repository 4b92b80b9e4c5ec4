//! ConversationEngine - Runs one turn of the conversation per inbound event.
//!
//! The engine looks up the transition for the user's current state, performs
//! its action (fixed reply, diet capture, completion, close) and commits the
//! next state. Turns for one user are serialized; different users run in
//! parallel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::UserLocks;
use crate::domain::conversation::{
    messages, transition, AckResult, ConversationState, EventKind, InboundEvent, NextState,
    Prompt, Session, TurnAction,
};
use crate::domain::foundation::{TurnId, UserId, ValidationError};
use crate::ports::{
    AIError, AIProvider, CompletionRequest, Delivery, FinishReason, MediaError, MediaResolver,
    NotificationSender, RequestMetadata, SessionStore, SessionStoreError,
};

/// Limits applied to every turn.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub media_timeout: Duration,
    pub completion_timeout: Duration,
    pub notify_timeout: Duration,
    /// Completion length cap, keeps answers chat-sized.
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            media_timeout: Duration::from_secs(15),
            completion_timeout: Duration::from_secs(30),
            notify_timeout: Duration::from_secs(10),
            max_tokens: 300,
            temperature: None,
        }
    }
}

/// A failed call to the media resolver or the completion service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("completion failed: {0}")]
    Completion(#[from] AIError),

    #[error("media resolution failed: {0}")]
    Media(#[from] MediaError),

    #[error("{stage} timed out after {timeout_secs}s")]
    Timeout {
        stage: &'static str,
        timeout_secs: u64,
    },
}

/// Why a turn did not commit.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The turn was aborted and the user got an apology.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("session store error: {0}")]
    Store(#[from] SessionStoreError),

    #[error("invalid session update: {0}")]
    Domain(#[from] ValidationError),
}

/// What a completed turn committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The session was saved in this state.
    Committed(ConversationState),
    /// The user ended the conversation; the session is gone.
    Closed,
    /// The stored session was unreadable and has been discarded.
    Reset,
}

/// Executes conversation turns against the injected ports.
pub struct ConversationEngine {
    sessions: Arc<dyn SessionStore>,
    ai_provider: Arc<dyn AIProvider>,
    media_resolver: Arc<dyn MediaResolver>,
    sender: Arc<dyn NotificationSender>,
    locks: UserLocks,
    config: EngineConfig,
}

impl ConversationEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        ai_provider: Arc<dyn AIProvider>,
        media_resolver: Arc<dyn MediaResolver>,
        sender: Arc<dyn NotificationSender>,
        config: EngineConfig,
    ) -> Self {
        let info = ai_provider.provider_info();
        if !info.supports_vision {
            warn!(
                provider = %info.name,
                model = %info.model,
                "Completion model does not accept images; image queries will be answered with an apology"
            );
        }
        Self {
            sessions,
            ai_provider,
            media_resolver,
            sender,
            locks: UserLocks::new(),
            config,
        }
    }

    /// True if the configured completion model accepts image inputs.
    pub fn accepts_images(&self) -> bool {
        self.ai_provider.provider_info().supports_vision
    }

    /// Returns the user id an event would be routed under, or `None` if the
    /// event is dropped without side effects.
    pub fn route(event: &InboundEvent) -> Option<UserId> {
        if event.kind == EventKind::Status {
            return None;
        }
        UserId::new(event.user_id.as_str()).ok()
    }

    /// Handles one inbound event.
    ///
    /// Always returns promptly with an acknowledgment; downstream failures are
    /// logged and never surface here.
    pub async fn handle(&self, event: InboundEvent) -> AckResult {
        let Some(user_id) = Self::route(&event) else {
            debug!(kind = ?event.kind, "Dropping event without routable sender");
            return AckResult::Ignored;
        };

        let turn_id = TurnId::new();
        {
            let _turn = self.locks.acquire(&user_id).await;
            match self.run_turn(&user_id, &event, turn_id).await {
                Ok(outcome) => info!(
                    user_id = %user_id,
                    turn_id = %turn_id,
                    kind = ?event.kind,
                    outcome = ?outcome,
                    "Turn completed"
                ),
                Err(err) => warn!(
                    user_id = %user_id,
                    turn_id = %turn_id,
                    kind = ?event.kind,
                    error = %err,
                    "Turn aborted"
                ),
            }
        }
        self.locks.release(&user_id).await;

        AckResult::Accepted
    }

    async fn run_turn(
        &self,
        user_id: &UserId,
        event: &InboundEvent,
        turn_id: TurnId,
    ) -> Result<TurnOutcome, TurnError> {
        let mut session = match self.sessions.get(user_id).await {
            Ok(Some(session)) => session,
            Ok(None) => Session::new(user_id.clone()),
            Err(SessionStoreError::UnknownState { state, .. }) => {
                warn!(
                    user_id = %user_id,
                    state = %state,
                    "Discarding session with unrecognized state"
                );
                self.sessions.delete(user_id).await?;
                self.notify(user_id, messages::RESET_APOLOGY).await;
                return Ok(TurnOutcome::Reset);
            }
            Err(err) => return Err(err.into()),
        };

        let state = session.state();
        let step = transition(state, event);
        debug!(user_id = %user_id, state = %state, action = ?step.action, "Transition selected");

        match step.action {
            TurnAction::Reply(text) => {
                let outcome = self.commit(&mut session, step.next).await?;
                self.notify(user_id, text).await;
                Ok(outcome)
            }
            TurnAction::RecordDiet { diet } => {
                session.set_diet(&diet)?;
                let outcome = self.commit(&mut session, step.next).await?;
                self.notify(user_id, &messages::diet_confirmation(&diet))
                    .await;
                Ok(outcome)
            }
            TurnAction::AnswerText { query } => {
                let prompt = Prompt::for_text(session.diet(), &query);
                let answer = self.complete(user_id, turn_id, prompt).await;
                self.finish_answer(&mut session, step.next, answer).await
            }
            TurnAction::AnswerImage { media_ref, caption } => {
                let answer = match self.resolve_media(&media_ref).await {
                    Ok(media) => {
                        let prompt =
                            Prompt::for_image(session.diet(), &media.url, caption.as_deref());
                        self.complete(user_id, turn_id, prompt).await
                    }
                    Err(err) => Err(err),
                };
                self.finish_answer(&mut session, step.next, answer).await
            }
            TurnAction::Close => {
                let outcome = self.commit(&mut session, step.next).await?;
                self.notify(user_id, messages::CLOSING).await;
                Ok(outcome)
            }
        }
    }

    /// Relays a completion and commits, or apologizes and leaves the session untouched.
    async fn finish_answer(
        &self,
        session: &mut Session,
        next: NextState,
        answer: Result<String, UpstreamError>,
    ) -> Result<TurnOutcome, TurnError> {
        let user_id = session.user_id().clone();
        match answer {
            Ok(answer) => {
                let outcome = self.commit(session, next).await?;
                self.notify(&user_id, &answer).await;
                self.notify(&user_id, messages::ANOTHER_QUERY).await;
                Ok(outcome)
            }
            Err(err) => {
                self.notify(&user_id, messages::UPSTREAM_APOLOGY).await;
                Err(err.into())
            }
        }
    }

    async fn commit(
        &self,
        session: &mut Session,
        next: NextState,
    ) -> Result<TurnOutcome, TurnError> {
        match next {
            NextState::Stay => {
                session.touch();
                self.sessions.put(session).await?;
                Ok(TurnOutcome::Committed(session.state()))
            }
            NextState::Goto(target) => {
                session.advance(target)?;
                self.sessions.put(session).await?;
                Ok(TurnOutcome::Committed(target))
            }
            NextState::End => {
                self.sessions.delete(session.user_id()).await?;
                Ok(TurnOutcome::Closed)
            }
        }
    }

    async fn resolve_media(
        &self,
        media_ref: &str,
    ) -> Result<crate::ports::ResolvedMedia, UpstreamError> {
        bounded(
            "media resolution",
            self.config.media_timeout,
            self.media_resolver.resolve(media_ref),
        )
        .await?
        .map_err(UpstreamError::from)
    }

    async fn complete(
        &self,
        user_id: &UserId,
        turn_id: TurnId,
        prompt: Prompt,
    ) -> Result<String, UpstreamError> {
        let mut request =
            CompletionRequest::from_prompt(prompt, RequestMetadata::new(user_id.clone(), turn_id))
                .with_max_tokens(self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        let response = bounded(
            "completion",
            self.config.completion_timeout,
            self.ai_provider.complete(request),
        )
        .await??;

        let content = response.content.trim();
        if content.is_empty() {
            return Err(AIError::EmptyResponse.into());
        }
        if response.finish_reason == FinishReason::Length {
            warn!(
                user_id = %user_id,
                turn_id = %turn_id,
                max_tokens = self.config.max_tokens,
                "Completion truncated at max_tokens"
            );
        }
        debug!(
            user_id = %user_id,
            turn_id = %turn_id,
            model = %response.model,
            finish_reason = ?response.finish_reason,
            total_tokens = response.usage.total_tokens,
            "Completion received"
        );
        Ok(content.to_string())
    }

    /// Sends one message. Failures are logged and absorbed.
    async fn notify(&self, user_id: &UserId, text: &str) -> Delivery {
        match timeout(self.config.notify_timeout, self.sender.send(user_id, text)).await {
            Ok(Ok(())) => Delivery::Sent,
            Ok(Err(err)) => {
                warn!(user_id = %user_id, error = %err, "Failed to deliver message");
                Delivery::Failed
            }
            Err(_) => {
                warn!(
                    user_id = %user_id,
                    timeout_secs = self.config.notify_timeout.as_secs(),
                    "Message delivery timed out"
                );
                Delivery::Failed
            }
        }
    }
}

async fn bounded<T>(
    stage: &'static str,
    limit: Duration,
    call: impl Future<Output = T>,
) -> Result<T, UpstreamError> {
    timeout(limit, call)
        .await
        .map_err(|_| UpstreamError::Timeout {
            stage,
            timeout_secs: limit.as_secs(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemorySessionStore, MockAIProvider, MockError, RecordingNotificationSender,
        StaticMediaResolver,
    };
    use crate::ports::{ProviderInfo, TokenUsage};

    const USER: &str = "whatsapp:+5491100000000";

    struct Harness {
        engine: ConversationEngine,
        store: InMemorySessionStore,
        ai: MockAIProvider,
        media: StaticMediaResolver,
        sender: RecordingNotificationSender,
    }

    fn harness_with(ai: MockAIProvider, media: StaticMediaResolver) -> Harness {
        let store = InMemorySessionStore::new();
        let sender = RecordingNotificationSender::new();
        let engine = ConversationEngine::new(
            Arc::new(store.clone()),
            Arc::new(ai.clone()),
            Arc::new(media.clone()),
            Arc::new(sender.clone()),
            EngineConfig::default(),
        );
        Harness {
            engine,
            store,
            ai,
            media,
            sender,
        }
    }

    fn harness() -> Harness {
        harness_with(MockAIProvider::new(), StaticMediaResolver::new())
    }

    fn user() -> UserId {
        UserId::new(USER).unwrap()
    }

    async fn state_of(h: &Harness) -> Option<ConversationState> {
        h.store.get(&user()).await.unwrap().map(|s| s.state())
    }

    async fn onboard(h: &Harness, diet: &str) {
        h.engine.handle(InboundEvent::text(USER, "hola")).await;
        h.engine.handle(InboundEvent::text(USER, diet)).await;
        h.sender.clear();
    }

    #[tokio::test]
    async fn first_message_greets_and_awaits_diet() {
        let h = harness();

        let ack = h.engine.handle(InboundEvent::text(USER, "hola")).await;

        assert_eq!(ack, AckResult::Accepted);
        assert_eq!(h.sender.texts_for(USER), vec![messages::GREETING]);
        assert_eq!(state_of(&h).await, Some(ConversationState::AwaitingDiet));
    }

    #[tokio::test]
    async fn empty_user_id_is_ignored_without_side_effects() {
        let h = harness();

        let ack = h.engine.handle(InboundEvent::text("  ", "hola")).await;

        assert_eq!(ack, AckResult::Ignored);
        assert_eq!(h.sender.count(), 0);
        assert_eq!(h.store.count().await, 0);
    }

    #[tokio::test]
    async fn status_events_are_ignored() {
        let h = harness();

        let ack = h.engine.handle(InboundEvent::status(USER)).await;

        assert_eq!(ack, AckResult::Ignored);
        assert_eq!(h.sender.count(), 0);
        assert_eq!(state_of(&h).await, None);
    }

    #[tokio::test]
    async fn diet_is_recorded_and_confirmed() {
        let h = harness();
        h.engine.handle(InboundEvent::text(USER, "hola")).await;
        h.sender.clear();

        h.engine.handle(InboundEvent::text(USER, " vegana ")).await;

        let session = h.store.get(&user()).await.unwrap().unwrap();
        assert_eq!(session.state(), ConversationState::AwaitingQuery);
        assert_eq!(session.diet(), Some("vegana"));
        assert_eq!(
            h.sender.texts_for(USER),
            vec![messages::diet_confirmation("vegana")]
        );
    }

    #[tokio::test]
    async fn text_query_relays_answer_then_asks_for_another() {
        let h = harness_with(
            MockAIProvider::new().with_response("Sí, el arroz integral es apto."),
            StaticMediaResolver::new(),
        );
        onboard(&h, "vegana").await;

        h.engine
            .handle(InboundEvent::text(USER, "¿arroz integral?"))
            .await;

        assert_eq!(
            h.sender.texts_for(USER),
            vec!["Sí, el arroz integral es apto.", messages::ANOTHER_QUERY]
        );
        assert_eq!(state_of(&h).await, Some(ConversationState::AwaitingFollowup));

        let calls = h.ai.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].max_tokens, Some(300));
        assert!(calls[0].system_prompt.as_deref().unwrap().contains("vegana"));
        assert_eq!(calls[0].messages[0].content.text(), "¿arroz integral?");
    }

    #[tokio::test]
    async fn image_query_resolves_media_before_completion() {
        let h = harness();
        onboard(&h, "keto").await;

        h.engine
            .handle(InboundEvent::image(USER, "m1").with_text("pan de centeno"))
            .await;

        assert_eq!(h.media.calls(), vec!["m1"]);
        let calls = h.ai.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].messages[0].content.image_url(),
            Some("https://media.example/m1")
        );
        assert!(calls[0].messages[0]
            .content
            .text()
            .contains("pan de centeno"));
        assert_eq!(state_of(&h).await, Some(ConversationState::AwaitingFollowup));
    }

    #[tokio::test]
    async fn media_failure_skips_completion_and_apologizes() {
        let h = harness_with(MockAIProvider::new(), StaticMediaResolver::failing());
        onboard(&h, "keto").await;

        h.engine.handle(InboundEvent::image(USER, "m1")).await;

        assert_eq!(h.ai.call_count(), 0);
        assert_eq!(h.sender.texts_for(USER), vec![messages::UPSTREAM_APOLOGY]);
        assert_eq!(state_of(&h).await, Some(ConversationState::AwaitingQuery));
    }

    #[tokio::test]
    async fn completion_failure_keeps_state_and_diet() {
        let h = harness_with(
            MockAIProvider::new().with_error(MockError::Unavailable {
                message: "overloaded".to_string(),
            }),
            StaticMediaResolver::new(),
        );
        onboard(&h, "vegana").await;

        h.engine.handle(InboundEvent::text(USER, "¿pan?")).await;

        let session = h.store.get(&user()).await.unwrap().unwrap();
        assert_eq!(session.state(), ConversationState::AwaitingQuery);
        assert_eq!(session.diet(), Some("vegana"));
        assert_eq!(h.sender.texts_for(USER), vec![messages::UPSTREAM_APOLOGY]);
    }

    #[tokio::test]
    async fn blank_completion_counts_as_failure() {
        let h = harness_with(
            MockAIProvider::new().with_response("   "),
            StaticMediaResolver::new(),
        );
        onboard(&h, "keto").await;

        h.engine.handle(InboundEvent::text(USER, "¿queso?")).await;

        assert_eq!(h.sender.texts_for(USER), vec![messages::UPSTREAM_APOLOGY]);
        assert_eq!(state_of(&h).await, Some(ConversationState::AwaitingQuery));
    }

    #[tokio::test]
    async fn slow_completion_times_out() {
        let store = InMemorySessionStore::new();
        let sender = RecordingNotificationSender::new();
        let engine = ConversationEngine::new(
            Arc::new(store.clone()),
            Arc::new(MockAIProvider::new().with_delay(Duration::from_millis(200))),
            Arc::new(StaticMediaResolver::new()),
            Arc::new(sender.clone()),
            EngineConfig {
                completion_timeout: Duration::from_millis(20),
                ..EngineConfig::default()
            },
        );
        engine.handle(InboundEvent::text(USER, "hola")).await;
        engine.handle(InboundEvent::text(USER, "keto")).await;
        sender.clear();

        engine.handle(InboundEvent::text(USER, "¿pan?")).await;

        assert_eq!(sender.texts_for(USER), vec![messages::UPSTREAM_APOLOGY]);
        let state = store.get(&user()).await.unwrap().map(|s| s.state());
        assert_eq!(state, Some(ConversationState::AwaitingQuery));
    }

    #[tokio::test]
    async fn negative_followup_closes_and_deletes_session() {
        let h = harness();
        onboard(&h, "keto").await;
        h.engine.handle(InboundEvent::text(USER, "¿pan?")).await;
        h.sender.clear();

        h.engine.handle(InboundEvent::text(USER, "No")).await;

        assert_eq!(h.sender.texts_for(USER), vec![messages::CLOSING]);
        assert_eq!(state_of(&h).await, None);
    }

    #[tokio::test]
    async fn unknown_stored_state_resets_session() {
        let h = harness();
        h.store.put_raw(&user(), "legacy_state", Some("keto")).await;

        let ack = h.engine.handle(InboundEvent::text(USER, "hola")).await;

        assert_eq!(ack, AckResult::Accepted);
        assert_eq!(h.sender.texts_for(USER), vec![messages::RESET_APOLOGY]);
        assert_eq!(state_of(&h).await, None);

        h.engine.handle(InboundEvent::text(USER, "hola")).await;
        assert_eq!(state_of(&h).await, Some(ConversationState::AwaitingDiet));
    }

    #[tokio::test]
    async fn delivery_failure_does_not_roll_back() {
        let store = InMemorySessionStore::new();
        let sender = RecordingNotificationSender::failing();
        let engine = ConversationEngine::new(
            Arc::new(store.clone()),
            Arc::new(MockAIProvider::new()),
            Arc::new(StaticMediaResolver::new()),
            Arc::new(sender.clone()),
            EngineConfig::default(),
        );

        let ack = engine.handle(InboundEvent::text(USER, "hola")).await;

        assert_eq!(ack, AckResult::Accepted);
        assert_eq!(sender.count(), 1);
        let state = store.get(&user()).await.unwrap().map(|s| s.state());
        assert_eq!(state, Some(ConversationState::AwaitingDiet));
    }

    #[test]
    fn accepts_images_follows_provider_capability() {
        assert!(harness().engine.accepts_images());

        let text_only = MockAIProvider::new()
            .with_provider_info(ProviderInfo::new("mock", "text-only").with_vision(false));
        let h = harness_with(text_only, StaticMediaResolver::new());
        assert!(!h.engine.accepts_images());
    }

    #[tokio::test]
    async fn truncated_completion_is_still_relayed_and_committed() {
        let h = harness_with(
            MockAIProvider::new().with_response_full(
                "La quinoa es apta, aunque conviene",
                TokenUsage::new(120, 300),
                FinishReason::Length,
            ),
            StaticMediaResolver::new(),
        );
        onboard(&h, "keto").await;

        h.engine.handle(InboundEvent::text(USER, "¿quinoa?")).await;

        assert_eq!(
            h.sender.texts_for(USER),
            vec!["La quinoa es apta, aunque conviene", messages::ANOTHER_QUERY]
        );
        assert_eq!(state_of(&h).await, Some(ConversationState::AwaitingFollowup));
    }

    #[test]
    fn route_rejects_status_and_blank_senders() {
        assert!(ConversationEngine::route(&InboundEvent::status(USER)).is_none());
        assert!(ConversationEngine::route(&InboundEvent::text("", "hola")).is_none());
        assert_eq!(
            ConversationEngine::route(&InboundEvent::unknown(USER)),
            Some(user())
        );
    }
}

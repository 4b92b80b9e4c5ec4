//! HTTP handlers for channel webhooks and liveness.
//!
//! Webhook handlers only authenticate, normalize and enqueue. Turn
//! processing happens on the dispatcher's workers, so providers get their
//! acknowledgment without waiting on the completion service.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Json, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::webhook::{
    parse_whatsapp_payload, SignatureVerifier, SubscriptionChallenge, TwilioInboundForm,
    WebhookPayloadError, EMPTY_TWIML, SIGNATURE_HEADER,
};
use crate::application::TurnDispatcher;
use crate::domain::conversation::AckResult;

use super::dto::{ErrorResponse, HealthResponse, WebhookAckResponse};

/// Body of `GET /`.
pub const BANNER: &str = "Bot de nutrición activo 🚀";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub dispatcher: TurnDispatcher,
    /// Present when an app secret is configured; unsigned posts are then rejected.
    pub signature_verifier: Option<SignatureVerifier>,
    /// Token expected in the WhatsApp subscription handshake.
    pub verify_token: Option<Arc<str>>,
}

impl WebhookAppState {
    pub fn new(dispatcher: TurnDispatcher) -> Self {
        Self {
            dispatcher,
            signature_verifier: None,
            verify_token: None,
        }
    }

    pub fn with_signature_verifier(mut self, verifier: SignatureVerifier) -> Self {
        self.signature_verifier = Some(verifier);
        self
    }

    pub fn with_verify_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.verify_token = Some(token.into());
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/twilio - Inbound message or status callback from Twilio
pub async fn handle_twilio_webhook(
    State(state): State<WebhookAppState>,
    form: Result<Form<TwilioInboundForm>, FormRejection>,
) -> impl IntoResponse {
    match form {
        Ok(Form(form)) => {
            let event = form.into_event();
            let kind = event.kind;
            let ack = state.dispatcher.dispatch(event);
            tracing::debug!(kind = ?kind, ack = ?ack, "Twilio webhook handled");
        }
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Ignoring malformed Twilio webhook");
        }
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        EMPTY_TWIML,
    )
}

/// GET /webhooks/whatsapp - Subscription verification handshake
pub async fn verify_whatsapp_subscription(
    State(state): State<WebhookAppState>,
    Query(challenge): Query<SubscriptionChallenge>,
) -> Result<String, WebhookApiError> {
    let expected = state.verify_token.as_deref().unwrap_or_default();
    let echoed = challenge.accept(expected).map_err(|err| {
        tracing::warn!("WhatsApp subscription handshake rejected");
        err
    })?;
    tracing::info!("WhatsApp webhook subscription verified");
    Ok(echoed)
}

/// POST /webhooks/whatsapp - Inbound messages and statuses from WhatsApp Cloud
pub async fn handle_whatsapp_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckResponse>, WebhookApiError> {
    if let Some(verifier) = &state.signature_verifier {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        verifier.verify(&body, signature)?;
    }

    let events = parse_whatsapp_payload(&body).map_err(|err| {
        tracing::warn!(error = %err, "Ignoring malformed WhatsApp webhook");
        err
    })?;

    let mut ack = WebhookAckResponse::default();
    for event in events {
        match state.dispatcher.dispatch(event) {
            AckResult::Accepted => ack.accepted += 1,
            AckResult::Ignored => ack.ignored += 1,
        }
    }
    tracing::debug!(accepted = ack.accepted, ignored = ack.ignored, "WhatsApp webhook handled");

    Ok(Json(ack))
}

/// GET /
pub async fn root() -> &'static str {
    BANNER
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookPayloadError);

impl From<WebhookPayloadError> for WebhookApiError {
    fn from(err: WebhookPayloadError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let error_code = match &self.0 {
            WebhookPayloadError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookPayloadError::MissingSignature => "MISSING_SIGNATURE",
            WebhookPayloadError::HandshakeRejected => "HANDSHAKE_REJECTED",
            WebhookPayloadError::Malformed(_) => "MALFORMED_PAYLOAD",
        };
        let error = ErrorResponse::new(error_code, self.0.to_string());
        (self.0.status_code(), Json(error)).into_response()
    }
}

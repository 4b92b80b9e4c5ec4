//! Axum router configuration for webhook and liveness endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    handle_twilio_webhook, handle_whatsapp_webhook, health, root, verify_whatsapp_subscription,
    WebhookAppState,
};

/// Create the channel webhook router.
///
/// # Routes
/// - `POST /twilio` - Twilio form-encoded webhooks
/// - `GET /whatsapp` - WhatsApp Cloud subscription handshake
/// - `POST /whatsapp` - WhatsApp Cloud JSON webhooks (signature verified)
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/twilio", post(handle_twilio_webhook))
        .route(
            "/whatsapp",
            get(verify_whatsapp_subscription).post(handle_whatsapp_webhook),
        )
}

/// Create the liveness router.
///
/// # Routes
/// - `GET /` - Banner
/// - `GET /health` - JSON health report
pub fn health_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

/// Create the complete router, with webhooks mounted at `/webhooks`.
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new()
        .merge(health_routes())
        .nest("/webhooks", webhook_routes())
}

//! HTTP adapter for channel webhooks.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, HealthResponse, WebhookAckResponse};
pub use handlers::{WebhookApiError, WebhookAppState, BANNER};
pub use routes::{health_routes, webhook_router, webhook_routes};

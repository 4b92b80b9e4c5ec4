use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nutribot::adapters::http::{build_app, WebhookAppState};
use nutribot::adapters::{
    InMemorySessionStore, OpenAIConfig, OpenAIProvider, PassthroughMediaResolver,
    SignatureVerifier, TwilioConfig, TwilioNotificationSender, WhatsAppCloudConfig,
    WhatsAppCloudMediaResolver, WhatsAppCloudNotificationSender,
};
use nutribot::application::{
    ConversationEngine, EngineConfig, EvictIdleSessionsHandler, TurnDispatcher,
};
use nutribot::config::{AppConfig, Channel, MessagingConfig, ValidationError};
use nutribot::ports::{MediaResolver, NotificationSender, SessionStore};

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    let (media_resolver, sender) = match channel_adapters(&config) {
        Ok(adapters) => adapters,
        Err(e) => {
            tracing::error!(error = %e, "failed to configure messaging channel");
            std::process::exit(1);
        }
    };

    let Some(api_key) = config.ai.openai_api_key.as_ref() else {
        tracing::error!("OPENAI_API_KEY is not set");
        std::process::exit(1);
    };
    let ai_provider = OpenAIProvider::new(
        OpenAIConfig::new(api_key.expose_secret().clone())
            .with_model(config.ai.model.clone())
            .with_base_url(config.ai.base_url.clone())
            .with_timeout(config.ai.timeout()),
    );

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let engine = ConversationEngine::new(
        sessions.clone(),
        Arc::new(ai_provider),
        media_resolver,
        sender,
        EngineConfig {
            media_timeout: config.conversation.media_timeout(),
            completion_timeout: config.conversation.completion_timeout(),
            notify_timeout: config.conversation.notify_timeout(),
            max_tokens: config.ai.max_tokens,
            temperature: config.ai.temperature,
        },
    );
    let dispatcher = TurnDispatcher::new(Arc::new(engine), config.conversation.worker_idle());

    if let Some(ttl) = config.conversation.session_idle_ttl() {
        EvictIdleSessionsHandler::new(sessions, ttl).spawn(config.conversation.sweep_interval());
        tracing::info!(ttl_secs = ttl.as_secs(), "Idle session eviction enabled");
    }

    let mut state = WebhookAppState::new(dispatcher);
    let messaging = &config.messaging;
    if let Some(token) = messaging.whatsapp_verify_token.as_deref() {
        state = state.with_verify_token(token);
    }
    if let Some(secret) = messaging.whatsapp_app_secret.as_ref() {
        state = state.with_signature_verifier(SignatureVerifier::new(
            secret.expose_secret().clone(),
        ));
    } else if messaging.channel == Channel::WhatsappCloud {
        tracing::warn!("WHATSAPP_APP_SECRET not set, webhook signatures are not verified");
    }

    let app = build_app(state, &config.server);

    let addr = match config.server.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "invalid listen address");
            std::process::exit(1);
        }
    };
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(
        %addr,
        channel = ?messaging.channel,
        model = %config.ai.model,
        "nutribot listening"
    );

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Builds the media resolver and sender for the selected channel.
fn channel_adapters(
    config: &AppConfig,
) -> Result<(Arc<dyn MediaResolver>, Arc<dyn NotificationSender>), ValidationError> {
    let messaging: &MessagingConfig = &config.messaging;
    let notify_timeout = config.conversation.notify_timeout();

    match messaging.channel {
        Channel::Twilio => {
            let sid = messaging
                .twilio_account_sid
                .as_deref()
                .ok_or(ValidationError::MissingRequired("TWILIO_ACCOUNT_SID"))?;
            let token = messaging
                .twilio_auth_token
                .as_ref()
                .ok_or(ValidationError::MissingRequired("TWILIO_AUTH_TOKEN"))?;
            let from = messaging
                .twilio_from_number
                .as_deref()
                .ok_or(ValidationError::MissingRequired("TWILIO_FROM_NUMBER"))?;

            let twilio = TwilioConfig::new(sid, token.expose_secret().clone(), from)
                .with_base_url(messaging.twilio_api_base_url.clone())
                .with_timeout(notify_timeout);
            Ok((
                Arc::new(PassthroughMediaResolver::new()),
                Arc::new(TwilioNotificationSender::new(twilio)),
            ))
        }
        Channel::WhatsappCloud => {
            let token = messaging
                .whatsapp_access_token
                .as_ref()
                .ok_or(ValidationError::MissingRequired("WHATSAPP_ACCESS_TOKEN"))?;
            let phone_number_id = messaging
                .whatsapp_phone_number_id
                .as_deref()
                .ok_or(ValidationError::MissingRequired("WHATSAPP_PHONE_NUMBER_ID"))?;

            let graph = WhatsAppCloudConfig::new(token.expose_secret().clone(), phone_number_id)
                .with_graph_base_url(messaging.graph_api_base_url.clone())
                .with_timeout(notify_timeout)
                .with_max_media_bytes(messaging.max_media_bytes as usize);
            let media_graph = graph.clone().with_timeout(config.conversation.media_timeout());
            Ok((
                Arc::new(WhatsAppCloudMediaResolver::new(media_graph)),
                Arc::new(WhatsAppCloudNotificationSender::new(graph)),
            ))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

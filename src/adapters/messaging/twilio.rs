//! Twilio messaging adapter.
//!
//! Sends WhatsApp messages through the Twilio Messages API and passes Twilio
//! media URLs straight through to the completion service.
//!
//! # Configuration
//!
//! ```ignore
//! let config = TwilioConfig::new(account_sid, auth_token, "whatsapp:+14155238886");
//! let sender = TwilioNotificationSender::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::domain::foundation::UserId;
use crate::ports::{
    DeliveryError, MediaError, MediaResolver, NotificationSender, ResolvedMedia,
};

/// Twilio API configuration.
#[derive(Clone)]
pub struct TwilioConfig {
    account_sid: String,
    auth_token: SecretString,
    /// Sender address, e.g. `whatsapp:+14155238886`.
    from_number: String,
    api_base_url: String,
    timeout: Duration,
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: SecretString::new(auth_token.into()),
            from_number: from_number.into(),
            api_base_url: "https://api.twilio.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Sends replies through Twilio's Messages API.
pub struct TwilioNotificationSender {
    config: TwilioConfig,
    http_client: reqwest::Client,
}

impl TwilioNotificationSender {
    pub fn new(config: TwilioConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    /// Form parameters for one outbound message.
    fn message_params<'a>(&'a self, to: &'a str, body: &'a str) -> [(&'static str, &'a str); 3] {
        [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ]
    }
}

#[async_trait]
impl NotificationSender for TwilioNotificationSender {
    async fn send(&self, user_id: &UserId, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .http_client
            .post(self.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&self.message_params(user_id.as_str(), text))
            .send()
            .await
            .map_err(|e| super::delivery_error(e, self.config.timeout))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            user_id = %user_id,
            status = status.as_u16(),
            error = %body,
            "Twilio message send failed"
        );
        match status.as_u16() {
            401 | 403 => Err(DeliveryError::AuthenticationFailed),
            code => Err(DeliveryError::Rejected { status: code, body }),
        }
    }
}

/// Uses Twilio media URLs as-is.
///
/// Twilio already hands out fetchable HTTPS URLs, so no staging is needed.
#[derive(Debug, Clone, Default)]
pub struct PassthroughMediaResolver;

impl PassthroughMediaResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaResolver for PassthroughMediaResolver {
    async fn resolve(&self, media_ref: &str) -> Result<ResolvedMedia, MediaError> {
        let media_ref = media_ref.trim();
        if media_ref.starts_with("https://") || media_ref.starts_with("http://") {
            Ok(ResolvedMedia::url(media_ref))
        } else {
            Err(MediaError::NotFound(format!(
                "expected an http(s) media URL, got '{}'",
                media_ref
            )))
        }
    }
}

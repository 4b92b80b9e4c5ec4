//! WhatsApp Cloud API adapter.
//!
//! Sends text messages through the Graph API and turns inbound media ids into
//! inline `data:` URLs. Graph media URLs require the access token to
//! download, so the completion service cannot fetch them directly; the image
//! is downloaded here and handed over inline instead.

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::UserId;
use crate::ports::{
    DeliveryError, MediaError, MediaResolver, NotificationSender, ResolvedMedia,
};

/// WhatsApp Cloud caps inbound images at 5 MB.
pub const DEFAULT_MAX_MEDIA_BYTES: usize = 5 * 1024 * 1024;

const SUPPORTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Graph API configuration shared by the sender and the media resolver.
#[derive(Clone)]
pub struct WhatsAppCloudConfig {
    access_token: SecretString,
    phone_number_id: String,
    /// e.g. `https://graph.facebook.com/v21.0`
    graph_base_url: String,
    timeout: Duration,
    max_media_bytes: usize,
}

impl WhatsAppCloudConfig {
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            phone_number_id: phone_number_id.into(),
            graph_base_url: "https://graph.facebook.com/v21.0".to_string(),
            timeout: Duration::from_secs(10),
            max_media_bytes: DEFAULT_MAX_MEDIA_BYTES,
        }
    }

    pub fn with_graph_base_url(mut self, url: impl Into<String>) -> Self {
        self.graph_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_media_bytes(mut self, max: usize) -> Self {
        self.max_media_bytes = max;
        self
    }

    fn base_url(&self) -> &str {
        self.graph_base_url.trim_end_matches('/')
    }

    fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .expect("Failed to create HTTP client")
    }
}

impl std::fmt::Debug for WhatsAppCloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppCloudConfig")
            .field("access_token", &"[REDACTED]")
            .field("phone_number_id", &self.phone_number_id)
            .field("graph_base_url", &self.graph_base_url)
            .finish()
    }
}

// ----- Sender -----

#[derive(Debug, Serialize)]
struct OutboundTextMessage<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: OutboundText<'a>,
}

#[derive(Debug, Serialize)]
struct OutboundText<'a> {
    preview_url: bool,
    body: &'a str,
}

impl<'a> OutboundTextMessage<'a> {
    fn new(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to,
            kind: "text",
            text: OutboundText {
                preview_url: false,
                body,
            },
        }
    }
}

/// Sends replies through `POST /{phone_number_id}/messages`.
pub struct WhatsAppCloudNotificationSender {
    config: WhatsAppCloudConfig,
    http_client: reqwest::Client,
}

impl WhatsAppCloudNotificationSender {
    pub fn new(config: WhatsAppCloudConfig) -> Self {
        let http_client = config.http_client();
        Self {
            config,
            http_client,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.config.base_url(),
            self.config.phone_number_id
        )
    }
}

#[async_trait]
impl NotificationSender for WhatsAppCloudNotificationSender {
    async fn send(&self, user_id: &UserId, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .http_client
            .post(self.messages_url())
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&OutboundTextMessage::new(user_id.as_str(), text))
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
            "WhatsApp Cloud message send failed"
        );
        match status.as_u16() {
            401 | 403 => Err(DeliveryError::AuthenticationFailed),
            code => Err(DeliveryError::Rejected { status: code, body }),
        }
    }
}

// ----- Media resolver -----

#[derive(Debug, Deserialize)]
struct MediaMetadata {
    url: String,
    mime_type: Option<String>,
    file_size: Option<usize>,
}

/// Resolves Graph media ids into inline `data:` URLs.
pub struct WhatsAppCloudMediaResolver {
    config: WhatsAppCloudConfig,
    http_client: reqwest::Client,
}

impl WhatsAppCloudMediaResolver {
    pub fn new(config: WhatsAppCloudConfig) -> Self {
        let http_client = config.http_client();
        Self {
            config,
            http_client,
        }
    }

    async fn fetch_metadata(&self, media_id: &str) -> Result<MediaMetadata, MediaError> {
        let response = self
            .http_client
            .get(format!("{}/{}", self.config.base_url(), media_id))
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                404 => MediaError::NotFound(media_id.to_string()),
                code => MediaError::Provider(format!("metadata error {}: {}", code, body)),
            });
        }

        response
            .json::<MediaMetadata>()
            .await
            .map_err(|e| MediaError::Provider(format!("invalid media metadata: {}", e)))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Provider(format!(
                "download error {}: {}",
                status.as_u16(),
                body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?;
        check_size(bytes.len(), self.config.max_media_bytes)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MediaResolver for WhatsAppCloudMediaResolver {
    async fn resolve(&self, media_ref: &str) -> Result<ResolvedMedia, MediaError> {
        let metadata = self.fetch_metadata(media_ref.trim()).await?;

        let mime_type = metadata
            .mime_type
            .as_deref()
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
            .unwrap_or_else(|| "image/jpeg".to_string());
        if !SUPPORTED_IMAGE_TYPES.contains(&mime_type.as_str()) {
            return Err(MediaError::UnsupportedType(mime_type));
        }
        if let Some(size) = metadata.file_size {
            check_size(size, self.config.max_media_bytes)?;
        }

        let bytes = self.download(&metadata.url).await?;
        tracing::debug!(
            media_id = %media_ref,
            mime_type = %mime_type,
            bytes = bytes.len(),
            "Inlined WhatsApp media"
        );

        Ok(ResolvedMedia::url(data_url(&mime_type, &bytes)).with_mime_type(mime_type))
    }
}

fn check_size(size: usize, max: usize) -> Result<(), MediaError> {
    if size > max {
        Err(MediaError::TooLarge { size, max })
    } else {
        Ok(())
    }
}

/// Encodes bytes as a base64 `data:` URL.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WhatsAppCloudConfig {
        WhatsAppCloudConfig::new("EAAG-token", "1098765")
            .with_graph_base_url("http://localhost:4020/v21.0/")
    }

    #[test]
    fn messages_url_uses_phone_number_id() {
        let sender = WhatsAppCloudNotificationSender::new(config());
        assert_eq!(
            sender.messages_url(),
            "http://localhost:4020/v21.0/1098765/messages"
        );
    }

    #[test]
    fn outbound_message_matches_graph_shape() {
        let body = serde_json::to_value(OutboundTextMessage::new("5491100000000", "Hola")).unwrap();
        assert_eq!(body["messaging_product"], "whatsapp");
        assert_eq!(body["to"], "5491100000000");
        assert_eq!(body["type"], "text");
        assert_eq!(body["text"]["body"], "Hola");
        assert_eq!(body["text"]["preview_url"], false);
    }

    #[test]
    fn data_url_encodes_bytes() {
        assert_eq!(data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn check_size_rejects_oversized_media() {
        assert!(check_size(10, 10).is_ok());
        assert!(matches!(
            check_size(11, 10),
            Err(MediaError::TooLarge { size: 11, max: 10 })
        ));
    }

    #[test]
    fn metadata_parses_graph_response() {
        let metadata: MediaMetadata = serde_json::from_str(
            r#"{"url":"https://lookaside.fbsbx.com/m1","mime_type":"image/jpeg","sha256":"x","file_size":2048,"id":"m1","messaging_product":"whatsapp"}"#,
        )
        .unwrap();
        assert_eq!(metadata.url, "https://lookaside.fbsbx.com/m1");
        assert_eq!(metadata.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(metadata.file_size, Some(2048));
    }

    #[test]
    fn debug_redacts_access_token() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("EAAG-token"));
    }
}

//! Messaging channel configuration (Twilio or WhatsApp Cloud API)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Which provider carries inbound and outbound WhatsApp messages
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Twilio,
    WhatsappCloud,
}

/// Messaging configuration
///
/// Only the credentials of the selected [`Channel`] are required.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    #[serde(default)]
    pub channel: Channel,

    /// Twilio account SID (AC...)
    pub twilio_account_sid: Option<String>,

    /// Twilio auth token
    pub twilio_auth_token: Option<SecretString>,

    /// Sender address, e.g. `whatsapp:+14155238886`
    pub twilio_from_number: Option<String>,

    #[serde(default = "default_twilio_api_base_url")]
    pub twilio_api_base_url: String,

    /// Graph API access token
    pub whatsapp_access_token: Option<SecretString>,

    pub whatsapp_phone_number_id: Option<String>,

    /// Token echoed back during the subscription handshake
    pub whatsapp_verify_token: Option<String>,

    /// App secret used to check `X-Hub-Signature-256`
    pub whatsapp_app_secret: Option<SecretString>,

    #[serde(default = "default_graph_api_base_url")]
    pub graph_api_base_url: String,

    /// Largest inbound image accepted from the Graph API, in bytes
    #[serde(default = "default_max_media_bytes")]
    pub max_media_bytes: u64,
}

impl MessagingConfig {
    /// Validate the credentials of the selected channel
    pub fn validate(&self, env: &Environment) -> Result<(), ValidationError> {
        match self.channel {
            Channel::Twilio => {
                require(self.twilio_account_sid.as_deref(), "TWILIO_ACCOUNT_SID")?;
                require_secret(self.twilio_auth_token.as_ref(), "TWILIO_AUTH_TOKEN")?;
                require(self.twilio_from_number.as_deref(), "TWILIO_FROM_NUMBER")?;
                require_http_url(&self.twilio_api_base_url, "Twilio API")?;
            }
            Channel::WhatsappCloud => {
                require_secret(self.whatsapp_access_token.as_ref(), "WHATSAPP_ACCESS_TOKEN")?;
                require(
                    self.whatsapp_phone_number_id.as_deref(),
                    "WHATSAPP_PHONE_NUMBER_ID",
                )?;
                require(self.whatsapp_verify_token.as_deref(), "WHATSAPP_VERIFY_TOKEN")?;
                require_http_url(&self.graph_api_base_url, "Graph API")?;
                // Unsigned webhooks are only tolerated outside production.
                if *env == Environment::Production {
                    require_secret(self.whatsapp_app_secret.as_ref(), "WHATSAPP_APP_SECRET")?;
                }
            }
        }
        Ok(())
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            channel: Channel::default(),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            twilio_api_base_url: default_twilio_api_base_url(),
            whatsapp_access_token: None,
            whatsapp_phone_number_id: None,
            whatsapp_verify_token: None,
            whatsapp_app_secret: None,
            graph_api_base_url: default_graph_api_base_url(),
            max_media_bytes: default_max_media_bytes(),
        }
    }
}

fn require(value: Option<&str>, name: &'static str) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingRequired(name)),
    }
}

fn require_secret(value: Option<&SecretString>, name: &'static str) -> Result<(), ValidationError> {
    require(value.map(|s| s.expose_secret().as_str()), name)
}

fn require_http_url(url: &str, name: &'static str) -> Result<(), ValidationError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl(name))
    }
}

fn default_twilio_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_graph_api_base_url() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

fn default_max_media_bytes() -> u64 {
    5 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> Option<SecretString> {
        Some(SecretString::new(s.to_string()))
    }

    fn twilio() -> MessagingConfig {
        MessagingConfig {
            twilio_account_sid: Some("AC123".to_string()),
            twilio_auth_token: secret("token"),
            twilio_from_number: Some("whatsapp:+14155238886".to_string()),
            ..Default::default()
        }
    }

    fn whatsapp() -> MessagingConfig {
        MessagingConfig {
            channel: Channel::WhatsappCloud,
            whatsapp_access_token: secret("EAAG"),
            whatsapp_phone_number_id: Some("1234567890".to_string()),
            whatsapp_verify_token: Some("verify-me".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = MessagingConfig::default();
        assert_eq!(config.channel, Channel::Twilio);
        assert_eq!(config.graph_api_base_url, "https://graph.facebook.com/v21.0");
        assert_eq!(config.max_media_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_channel_deserializes_snake_case() {
        let channel: Channel = serde_json::from_str("\"whatsapp_cloud\"").unwrap();
        assert_eq!(channel, Channel::WhatsappCloud);
    }

    #[test]
    fn test_twilio_requires_credentials() {
        assert!(twilio().validate(&Environment::Development).is_ok());

        let config = MessagingConfig {
            twilio_auth_token: None,
            ..twilio()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("TWILIO_AUTH_TOKEN"))
        );
    }

    #[test]
    fn test_whatsapp_credentials_ignored_for_twilio() {
        let config = MessagingConfig {
            whatsapp_access_token: None,
            ..twilio()
        };
        assert!(config.validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_whatsapp_requires_verify_token() {
        let config = MessagingConfig {
            whatsapp_verify_token: Some("  ".to_string()),
            ..whatsapp()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("WHATSAPP_VERIFY_TOKEN"))
        );
    }

    #[test]
    fn test_whatsapp_app_secret_required_in_production() {
        assert!(whatsapp().validate(&Environment::Development).is_ok());
        assert_eq!(
            whatsapp().validate(&Environment::Production),
            Err(ValidationError::MissingRequired("WHATSAPP_APP_SECRET"))
        );

        let config = MessagingConfig {
            whatsapp_app_secret: secret("app-secret"),
            ..whatsapp()
        };
        assert!(config.validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_invalid_graph_url() {
        let config = MessagingConfig {
            graph_api_base_url: "graph.facebook.com".to_string(),
            ..whatsapp()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidUrl("Graph API"))
        );
    }
}

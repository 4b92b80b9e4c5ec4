//! Media Resolver Port - Turns an opaque inbound media handle into a locator
//! the completion service can read.
//!
//! Returned locators may be time-limited; callers consume them within the
//! same turn.

use async_trait::async_trait;

/// A resolved image locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// `https://` URL or inline `data:` URL.
    pub url: String,
    /// MIME type, when the provider reported one.
    pub mime_type: Option<String>,
}

impl ResolvedMedia {
    /// Creates a resolved locator without a known MIME type.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: None,
        }
    }

    /// Sets the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Media resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media not found: {0}")]
    NotFound(String),

    #[error("unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("media too large: {size} bytes exceeds {max}")]
    TooLarge { size: usize, max: usize },

    #[error("media provider error: {0}")]
    Provider(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Port for resolving inbound media references.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Resolve `media_ref` into a fetchable locator.
    async fn resolve(&self, media_ref: &str) -> Result<ResolvedMedia, MediaError>;
}

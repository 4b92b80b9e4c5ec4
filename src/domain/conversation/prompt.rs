//! Prompt construction for the completion service.
//!
//! Everything here is pure: the same `(diet, text | image)` input always
//! yields the same prompt.

use serde::{Deserialize, Serialize};

/// Diet name used when the session has none recorded.
pub const FALLBACK_DIET: &str = "general";

/// User-side content of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum UserContent {
    /// Text-only turn.
    Text { text: String },
    /// Image turn: instruction text plus a resolved image locator.
    TextWithImage { text: String, image_url: String },
}

impl UserContent {
    /// The textual part of the content.
    pub fn text(&self) -> &str {
        match self {
            Self::Text { text } | Self::TextWithImage { text, .. } => text,
        }
    }

    /// The image locator, for image turns.
    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::TextWithImage { image_url, .. } => Some(image_url),
        }
    }
}

/// System instruction plus user content for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub user_content: UserContent,
}

impl Prompt {
    /// Prompt for a text query.
    pub fn for_text(diet: Option<&str>, text: &str) -> Self {
        Self {
            system_instruction: system_instruction(diet),
            user_content: UserContent::Text {
                text: text.trim().to_string(),
            },
        }
    }

    /// Prompt for an image query. `caption` is the text sent with the photo, if any.
    pub fn for_image(diet: Option<&str>, image_url: &str, caption: Option<&str>) -> Self {
        let diet = effective_diet(diet);
        let mut text = format!("¿Puedo comer esto en la dieta {}?", diet);
        if let Some(caption) = caption.map(str::trim).filter(|c| !c.is_empty()) {
            text.push_str("\nComentario del usuario: ");
            text.push_str(caption);
        }
        Self {
            system_instruction: system_instruction(Some(diet)),
            user_content: UserContent::TextWithImage {
                text,
                image_url: image_url.to_string(),
            },
        }
    }
}

/// Builds the system instruction for the given diet.
pub fn system_instruction(diet: Option<&str>) -> String {
    format!(
        "Sos un nutricionista virtual. El usuario sigue una dieta {diet}.\n\
         - Indicá con claridad si el alimento consultado es apto para una dieta {diet} y por qué.\n\
         - Si el alimento contiene carbohidratos, estimá su índice glucémico (bajo, medio o alto).\n\
         - Si la información no alcanza para responder con seguridad, pedí una aclaración \
         en lugar de adivinar.\n\
         - Respondé en pocas oraciones, en un tono apto para un chat.",
        diet = effective_diet(diet)
    )
}

fn effective_diet(diet: Option<&str>) -> &str {
    diet.map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(FALLBACK_DIET)
}

//! Interpretation of the user's answer to "another query?".

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A recognized yes/no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowupAnswer {
    Yes,
    No,
}

impl FollowupAnswer {
    /// Classifies free text, ignoring case, accents, surrounding whitespace
    /// and punctuation. Returns `None` for anything that is not a clear answer.
    pub fn classify(text: &str) -> Option<Self> {
        let normalized = normalize(text);
        match normalized.as_str() {
            "si" | "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() || matches!(c, '¡' | '¿'))
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

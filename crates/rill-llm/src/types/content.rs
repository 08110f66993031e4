use serde::{Deserialize, Serialize};

/// Message content, either plain text or an ordered list of typed parts.
///
/// Some providers only accept the parts form for user turns; see
/// [`crate::provider::adapt_messages`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Simple text content
    Text(String),

    /// Multipart content
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
}

impl Content {
    /// Create text content
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Wrap text in a single-element parts list
    pub fn text_part(s: impl Into<String>) -> Self {
        Self::Parts(vec![ContentPart::Text { text: s.into() }])
    }

    /// Get as plain text (if possible)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Parts(parts) => {
                if parts.len() == 1 {
                    let ContentPart::Text { text } = &parts[0];
                    return Some(text);
                }
                None
            }
        }
    }

    /// Concatenation of all text carried by this content.
    pub fn joined_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Parts(parts) => parts
                .iter()
                .map(|ContentPart::Text { text }| text.as_str())
                .collect(),
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

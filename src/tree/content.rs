//! Step content as produced by oracles and hosts.
//!
//! Messages may carry plain text or a list of typed parts. Trajectories are
//! always built from the normalized plain-text form.

use serde::{Deserialize, Serialize};

/// Placeholder emitted for image parts when flattening content to text
pub const IMAGE_PLACEHOLDER: &str = "<image>";

/// A single typed part of structured content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { url: String },
}

/// Content of a reasoning step: plain text or structured parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Flattens the content into the plain text used for trajectories.
    ///
    /// Text parts are joined with a newline, image parts become
    /// [`IMAGE_PLACEHOLDER`].
    pub fn normalize(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => text.as_str(),
                    ContentPart::ImageUrl { .. } => IMAGE_PLACEHOLDER,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.normalize().trim().is_empty()
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Vec<ContentPart>> for Content {
    fn from(parts: Vec<ContentPart>) -> Self {
        Content::Parts(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_unchanged() {
        let content = Content::from("Step one");
        assert_eq!(content.normalize(), "Step one");
    }

    #[test]
    fn test_parts_are_joined_with_image_placeholder() {
        let content = Content::Parts(vec![
            ContentPart::Text {
                text: "Look at this".to_string(),
            },
            ContentPart::ImageUrl {
                url: "https://example.invalid/a.png".to_string(),
            },
            ContentPart::Text {
                text: "then answer".to_string(),
            },
        ]);
        assert_eq!(content.normalize(), "Look at this\n<image>\nthen answer");
    }

    #[test]
    fn test_untagged_deserialization_accepts_both_shapes() {
        let text: Content = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(text, Content::Text("hello".to_string()));

        let parts: Content =
            serde_json::from_str(r#"[{"type":"text","text":"a"},{"type":"image_url","url":"u"}]"#)
                .unwrap();
        assert_eq!(parts.normalize(), "a\n<image>");
    }

    #[test]
    fn test_blank_detection() {
        assert!(Content::from("   \n").is_blank());
        assert!(Content::Parts(vec![]).is_blank());
        assert!(!Content::from("x").is_blank());
    }
}

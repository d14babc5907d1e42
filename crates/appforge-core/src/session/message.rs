//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles and multimodal content parts.

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System framing message (prepended by the prompt composer).
    System,
}

/// An image reference carried inside a message part.
///
/// The URL is a data URL (`data:image/...;base64,...`) resolved from the
/// staged-image store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a message's content: either text or an image reference.
///
/// Serializes in the OpenAI-compatible multimodal shape
/// (`{"type":"text","text":...}` / `{"type":"image_url","image_url":{...}}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an image part from a data URL.
    pub fn image(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }

    /// Returns true if this part is an image reference.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::ImageUrl { .. })
    }
}

/// A single message in a conversation history.
///
/// Messages are append-only: once recorded they are never mutated in
/// place. The only removal is suffix truncation during a history fork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: MessageRole,
    /// Ordered content parts (text and image references).
    pub content: Vec<ContentPart>,
    /// Opaque token linking a user message to the assistant message it
    /// produced. Used to locate the truncation point on a fork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl Message {
    /// Creates a user message with a single text part.
    pub fn user(text: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentPart::text(text)],
            correlation_id: Some(correlation_id.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates an assistant message with a single text part.
    pub fn assistant(text: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentPart::text(text)],
            correlation_id: Some(correlation_id.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates a user message with no correlation token, for out-of-band
    /// requests (the repair completion) that never enter the session log.
    pub fn user_uncorrelated(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentPart::text(text)],
            correlation_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates a system message with a single text part and no correlation.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: vec![ContentPart::text(text)],
            correlation_id: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Appends an image part to this message.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.content.push(ContentPart::image(url));
        self
    }

    /// Returns the concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns true if any content part is an image reference.
    pub fn has_image(&self) -> bool {
        self.content.iter().any(ContentPart::is_image)
    }

    /// Returns a copy of this message with all image parts removed.
    ///
    /// Text parts are preserved verbatim. Used before submitting history
    /// to a model without image-input capability.
    pub fn without_images(&self) -> Self {
        let mut stripped = self.clone();
        stripped.content.retain(|part| !part.is_image());
        stripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_images_preserves_text_verbatim() {
        let msg = Message::user("make it blue", "c1").with_image("data:image/png;base64,AAAA");
        assert!(msg.has_image());

        let stripped = msg.without_images();
        assert!(!stripped.has_image());
        assert_eq!(stripped.text(), "make it blue");
        assert_eq!(stripped.correlation_id.as_deref(), Some("c1"));
    }

    #[test]
    fn content_parts_serialize_in_wire_shape() {
        let part = ContentPart::image("data:image/png;base64,AAAA");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/png;base64,AAAA");

        let text = serde_json::to_value(ContentPart::text("hi")).unwrap();
        assert_eq!(text["type"], "text");
        assert_eq!(text["text"], "hi");
    }
}

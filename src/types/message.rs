//! Message parts exchanged with the text-generation backend

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::mode::ConversationMode;

/// Author of a turn held in session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One part of a message: text or an inline binary attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Part {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "inline_data")]
    InlineData { mime_type: String, data: String }, // base64 encoded
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

impl From<&ImageAttachment> for Part {
    fn from(image: &ImageAttachment) -> Self {
        Part::InlineData {
            mime_type: image.media_type.clone(),
            data: image.data.clone(),
        }
    }
}

/// A role-tagged message, as kept in a session's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// An image attached to a user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub media_type: String,
    pub data: String, // base64 encoded
}

impl ImageAttachment {
    pub fn from_base64(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Read an image file; the media type is guessed from the extension,
    /// falling back to `default_media_type`.
    pub fn from_file(path: impl AsRef<Path>, default_media_type: &str) -> crate::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let media_type = guess_media_type(path).unwrap_or(default_media_type);
        Ok(Self::from_bytes(&bytes, media_type))
    }
}

/// The composed request for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestPayload {
    pub mode: ConversationMode,
    pub parts: Vec<Part>,
}

impl RequestPayload {
    /// The text part sent to the backend.
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(Part::as_text)
    }

    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::InlineData { .. }))
    }
}

fn guess_media_type(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mt = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mt)
}

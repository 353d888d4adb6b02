use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use super::{image::sniff_mime, profile::{Orientation, SubjectProfile}};

/// An uploaded image attached to a named slot by the workflow runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub slot: String,
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(slot: impl Into<String>, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime_type = sniff_mime(&bytes).to_string();
        Self {
            slot: slot.into(),
            name: name.into(),
            bytes,
            mime_type,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

/// Everything the prompt builder needs. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub profile: SubjectProfile,
    pub orientation: Orientation,
    pub product_description: Option<String>,
    /// The first image is the hero product; the rest are auxiliary pieces.
    pub reference_images: Vec<ReferenceImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "payload")]
pub enum Part {
    Text(String),
    Image(InlineImage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn image(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Part::Image(InlineImage {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        })
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Part::Image(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptResult {
    pub text: String,
    pub parts: Vec<Part>,
}

impl PromptResult {
    pub fn image_count(&self) -> usize {
        self.parts.iter().filter(|p| p.is_image()).count()
    }
}

/// One prompt per angle, consumed by `Orchestrator::generate_all_angles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnglePrompts {
    pub front: PromptResult,
    pub back: PromptResult,
    pub face: PromptResult,
}

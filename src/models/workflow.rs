use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::{
    image::{sniff_mime, UploadResult},
    profile::{or_default, Orientation, SubjectProfile},
    prompt::{GenerationRequest, ReferenceImage},
    Angle,
};
use crate::error::{Result, StudioError};

/// Record handed over by the workflow runner.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInput {
    pub user_id: String,
    pub resource_id: String,
    #[serde(default, deserialize_with = "or_default")]
    pub profile: SubjectProfile,
    #[serde(default, deserialize_with = "or_default")]
    pub orientation: Orientation,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub reference_images: Vec<ReferenceImageInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImageInput {
    pub slot: String,
    #[serde(default)]
    pub name: String,
    /// Base64, optionally prefixed with a `data:` URL header.
    pub data: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl ReferenceImageInput {
    pub fn decode(&self) -> Result<ReferenceImage> {
        let payload = match self.data.split_once(',') {
            Some((header, rest)) if header.starts_with("data:") => rest,
            _ => self.data.as_str(),
        };
        let bytes = STANDARD.decode(payload.trim()).map_err(|e| {
            StudioError::Serialization(format!("reference image '{}': {}", self.slot, e))
        })?;
        let mime_type = self
            .mime_type
            .clone()
            .unwrap_or_else(|| sniff_mime(&bytes).to_string());
        Ok(ReferenceImage {
            slot: self.slot.clone(),
            name: self.name.clone(),
            bytes,
            mime_type,
        })
    }
}

impl WorkflowInput {
    pub fn to_request(&self) -> Result<GenerationRequest> {
        if self.user_id.trim().is_empty() || self.resource_id.trim().is_empty() {
            return Err(StudioError::Request(
                "userId and resourceId are required".into(),
            ));
        }
        let reference_images = self
            .reference_images
            .iter()
            .map(ReferenceImageInput::decode)
            .collect::<Result<Vec<_>>>()?;
        Ok(GenerationRequest {
            profile: self.profile.clone(),
            orientation: self.orientation,
            product_description: self.product_description.clone(),
            reference_images,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedAngles {
    pub front: String,
    pub back: String,
    pub face: String,
}

impl PublishedAngles {
    /// Collects the three uploads; any missing angle is an error.
    pub fn from_uploads(uploads: &[UploadResult]) -> Result<Self> {
        let url_for = |angle: Angle| {
            uploads
                .iter()
                .find(|u| u.angle == angle)
                .map(|u| u.public_url.clone())
                .ok_or_else(|| StudioError::Internal(format!("missing {} upload", angle)))
        };
        Ok(PublishedAngles {
            front: url_for(Angle::Front)?,
            back: url_for(Angle::Back)?,
            face: url_for(Angle::Face)?,
        })
    }
}

/// Record returned to the workflow runner, which branches on `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PublishedAngles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowOutput {
    pub fn ok(result: PublishedAngles) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

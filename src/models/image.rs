use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera perspective generated per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Angle {
    Front,
    Back,
    Face,
}

impl Angle {
    pub const ALL: [Angle; 3] = [Angle::Front, Angle::Back, Angle::Face];

    pub fn as_str(&self) -> &'static str {
        match self {
            Angle::Front => "front",
            Angle::Back => "back",
            Angle::Face => "face",
        }
    }

    /// Back and face are anchored on the front image.
    pub fn needs_identity_anchor(&self) -> bool {
        !matches!(self, Angle::Front)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated image for one angle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngleImage {
    pub angle: Angle,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AngleImage {
    pub fn new(angle: Angle, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            angle,
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// A complete front/back/face set. Only constructible once all three exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngleSet {
    pub front: AngleImage,
    pub back: AngleImage,
    pub face: AngleImage,
}

impl AngleSet {
    pub fn iter(&self) -> impl Iterator<Item = &AngleImage> {
        [&self.front, &self.back, &self.face].into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub angle: Angle,
    pub public_url: String,
}

/// File extension (with dot) for a MIME type; unknown types store as png.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();
    if mime.contains("jpeg") || mime.contains("jpg") {
        ".jpg"
    } else if mime.contains("webp") {
        ".webp"
    } else {
        ".png"
    }
}

/// Best-effort MIME detection from magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for_mime("image/jpeg"), ".jpg");
        assert_eq!(extension_for_mime("image/png"), ".png");
        assert_eq!(extension_for_mime("image/webp"), ".webp");
        assert_eq!(extension_for_mime("image/heic"), ".png");
        assert_eq!(extension_for_mime(""), ".png");
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_mime(b"\x89PNG\r\n"), "image/png");
    }

    #[test]
    fn test_angle_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Angle::Face).unwrap(), "\"face\"");
        assert!(!Angle::Front.needs_identity_anchor());
        assert!(Angle::Back.needs_identity_anchor());
    }
}

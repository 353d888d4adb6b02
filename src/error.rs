use thiserror::Error;

use crate::models::Angle;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Response error: {0}")]
    Response(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Upstream unavailable ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("No image returned for {angle} angle")]
    EmptyResult { angle: Angle },
    #[error("Upload of {angle} image failed ({status}): {message}")]
    Storage {
        angle: Angle,
        status: u16,
        message: String,
    },
    #[error("Cannot generate {angle} angle without a completed front image")]
    MissingFrontImage { angle: Angle },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudioError {
    /// 503 and 429 responses are retried on the unavailable backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, StudioError::Upstream { status, .. } if *status == 503 || *status == 429)
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(e: serde_json::Error) -> Self {
        StudioError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let unavailable = StudioError::Upstream {
            status: 503,
            message: "overloaded".into(),
        };
        let throttled = StudioError::Upstream {
            status: 429,
            message: "quota".into(),
        };
        let bad_request = StudioError::Upstream {
            status: 400,
            message: "bad".into(),
        };
        assert!(unavailable.is_transient());
        assert!(throttled.is_transient());
        assert!(!bad_request.is_transient());
        assert!(!StudioError::Request("timeout".into()).is_transient());
    }

    #[test]
    fn test_messages_name_the_angle() {
        let err = StudioError::Storage {
            angle: Angle::Back,
            status: 403,
            message: "denied".into(),
        };
        assert_eq!(err.to_string(), "Upload of back image failed (403): denied");

        let err = StudioError::MissingFrontImage { angle: Angle::Face };
        assert!(err.to_string().contains("face"));
    }
}

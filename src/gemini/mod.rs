pub mod client;
pub mod wire;

use async_trait::async_trait;

use crate::{error::Result, models::Part};

pub use client::GeminiClient;

/// Raw image returned by one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// One call against a generative image API.
///
/// `Ok(None)` means the call succeeded but carried no image payload. Service
/// unavailability surfaces as `StudioError::Upstream` so callers can tell it
/// apart from hard failures.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, parts: &[Part]) -> Result<Option<GeneratedImage>>;
}

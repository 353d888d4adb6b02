use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};

use super::{
    wire::{GenerateContentRequest, GenerateContentResponse},
    GeneratedImage, ImageGenerator,
};
use crate::{
    config::{GeminiConfig, REQUEST_TIMEOUT},
    error::{Result, StudioError},
    models::{sniff_mime, Part},
};

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| StudioError::Config("GEMINI_API_KEY is required".into()))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StudioError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: config.model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, parts: &[Part]) -> Result<Option<GeneratedImage>> {
        let payload = GenerateContentRequest::new(parts, self.temperature);
        let image_parts = parts.iter().filter(|p| p.is_image()).count();

        log::debug!(
            "Calling {} with {} parts ({} images)",
            self.model,
            parts.len(),
            image_parts
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| StudioError::Request(format!("Gemini request failed: {}", e.without_url())))?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::TOO_MANY_REQUESTS {
            let message = response.text().await.unwrap_or_default();
            return Err(StudioError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::Response(format!(
                "Gemini returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| StudioError::Response(format!("Malformed Gemini response: {}", e)))?;

        let Some(inline) = body.first_inline_image() else {
            log::warn!("Gemini response for {} carried no image", self.model);
            return Ok(None);
        };

        let bytes = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| StudioError::Response(format!("Gemini image base64 decode failed: {}", e)))?;
        let mime_type = if inline.mime_type.is_empty() {
            sniff_mime(&bytes).to_string()
        } else {
            inline.mime_type.clone()
        };

        Ok(Some(GeneratedImage { bytes, mime_type }))
    }
}

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;

use super::traits::{AssetStore, UploadFailure};
use crate::{
    config::{StorageConfig, REQUEST_TIMEOUT},
    error::{Result, StudioError},
};

/// Supabase Storage bucket accessed with the service-role key.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    bucket: String,
    headers: HeaderMap,
}

impl SupabaseStore {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let headers = auth_headers(config.key()?)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StudioError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            bucket: config.bucket,
            headers,
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }
}

/// `apikey` + bearer headers shared by storage and REST calls.
pub(crate) fn auth_headers(key: &str) -> Result<HeaderMap> {
    let invalid = |_| StudioError::Config("service key contains invalid header characters".into());
    let mut headers = HeaderMap::new();
    headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?,
    );
    Ok(headers)
}

#[async_trait]
impl AssetStore for SupabaseStore {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> std::result::Result<(), UploadFailure> {
        let size = bytes.len();
        let response = self
            .client
            .post(self.object_url(path))
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, mime_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| UploadFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        log::debug!("Stored {} bytes at {}/{}", size, self.bucket, path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let store = SupabaseStore::new(
            StorageConfig::new()
                .with_credentials("https://proj.supabase.co/", "service")
                .with_bucket("shots"),
        )
        .unwrap();
        assert_eq!(
            store.object_url("u/r/front.png"),
            "https://proj.supabase.co/storage/v1/object/shots/u/r/front.png"
        );
        assert_eq!(
            store.public_url("u/r/front.png"),
            "https://proj.supabase.co/storage/v1/object/public/shots/u/r/front.png"
        );
    }

    #[test]
    fn test_requires_credentials() {
        assert!(matches!(
            SupabaseStore::new(StorageConfig::new()),
            Err(StudioError::Config(_))
        ));
    }
}

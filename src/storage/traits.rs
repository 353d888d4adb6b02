use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Object storage with upsert writes and public-read URLs.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Write `bytes` to `path`, overwriting any existing object.
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> std::result::Result<(), UploadFailure>;

    fn public_url(&self, path: &str) -> String;
}

#[async_trait]
impl<T: AssetStore + ?Sized> AssetStore for std::sync::Arc<T> {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> std::result::Result<(), UploadFailure> {
        (**self).put_object(path, bytes, mime_type).await
    }

    fn public_url(&self, path: &str) -> String {
        (**self).public_url(path)
    }
}

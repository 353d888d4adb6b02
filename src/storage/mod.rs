pub mod supabase;
pub mod traits;

use std::sync::Arc;

use crate::{
    error::{Result, StudioError},
    logger,
    models::{extension_for_mime, Angle, AngleSet, UploadResult},
    retry::{RetryPolicy, Sleeper, TokioSleeper},
};

pub use supabase::SupabaseStore;
pub use traits::{AssetStore, UploadFailure};

/// `{userId}/{resourceId}/{angle}{ext}`; the same inputs always give the same path.
pub fn object_path(user_id: &str, resource_id: &str, angle: Angle, extension: &str) -> String {
    format!("{}/{}/{}{}", user_id, resource_id, angle, extension)
}

/// Ids end up verbatim in object URLs, so only `[A-Za-z0-9._-]` is allowed.
fn validate_segment(name: &str, value: &str) -> Result<()> {
    let value = value.trim();
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if value.is_empty() || value == "." || value == ".." || !value.chars().all(allowed) {
        return Err(StudioError::Request(format!(
            "{} must be a single path segment of letters, digits, '.', '_' or '-', got {:?}",
            name, value
        )));
    }
    Ok(())
}

fn upload_error(angle: Angle, failure: UploadFailure) -> StudioError {
    match failure {
        UploadFailure::Status { status, body } => StudioError::Storage {
            angle,
            status,
            message: body,
        },
        UploadFailure::Transport(message) => {
            StudioError::Request(format!("Upload of {} image failed: {}", angle, message))
        }
    }
}

/// Uploads the generated angles of one resource owned by one user.
pub struct Publisher<S> {
    store: S,
    user_id: String,
    resource_id: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<S: AssetStore> Publisher<S> {
    pub fn new(store: S, user_id: impl Into<String>, resource_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        let resource_id = resource_id.into();
        validate_segment("userId", &user_id)?;
        validate_segment("resourceId", &resource_id)?;
        Ok(Self {
            store,
            user_id: user_id.trim().to_string(),
            resource_id: resource_id.trim().to_string(),
            retry: RetryPolicy::default().single_attempt(),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Retry failed uploads while attempts remain, waiting
    /// `attempt × unavailable_backoff` between them. Single-shot otherwise.
    pub fn with_retry(mut self, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        self.retry = policy;
        self.sleeper = sleeper;
        self
    }

    pub async fn publish(&self, angle: Angle, image_bytes: &[u8], mime_type: &str) -> Result<UploadResult> {
        let path = object_path(
            &self.user_id,
            &self.resource_id,
            angle,
            extension_for_mime(mime_type),
        );

        let mut attempt = 1;
        loop {
            match self
                .store
                .put_object(&path, image_bytes.to_vec(), mime_type)
                .await
            {
                Ok(()) => break,
                Err(failure) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.unavailable_backoff * attempt;
                    log::warn!(
                        "Upload of {} image failed on attempt {}/{} ({}), retrying in {}ms",
                        angle,
                        attempt,
                        self.retry.max_attempts,
                        failure,
                        delay.as_millis()
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(upload_error(angle, failure)),
            }
        }

        let public_url = self.store.public_url(&path);
        log::info!("Published {} image to {}", angle, public_url);
        Ok(UploadResult { angle, public_url })
    }

    /// Front, back, face in order. The first failure fails the whole step.
    pub async fn publish_all(&self, set: &AngleSet) -> Result<Vec<UploadResult>> {
        let _timer = logger::timer("publish");
        let mut uploads = Vec::with_capacity(3);
        for image in set.iter() {
            uploads.push(self.publish(image.angle, &image.bytes, &image.mime_type).await?);
        }
        Ok(uploads)
    }
}

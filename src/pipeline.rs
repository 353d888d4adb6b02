use std::sync::Arc;

use crate::{
    config::Config,
    error::Result,
    gemini::{GeminiClient, ImageGenerator},
    models::{PublishedAngles, WorkflowInput, WorkflowOutput},
    orchestrator::Orchestrator,
    prompt::PromptBuilder,
    retry::{RetryPolicy, Sleeper, TokioSleeper},
    storage::{AssetStore, Publisher, SupabaseStore},
};

/// Prompt Builder → Orchestrator → Publisher for one workflow record.
pub struct Pipeline<G, S = TokioSleeper> {
    prompts: PromptBuilder,
    orchestrator: Orchestrator<G, S>,
    store: Arc<dyn AssetStore>,
    upload_retry: RetryPolicy,
    upload_sleeper: Arc<dyn Sleeper>,
}

impl Pipeline<GeminiClient, TokioSleeper> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let generator = GeminiClient::new(config.gemini.clone())?;
        let store = SupabaseStore::new(config.storage.clone())?;
        Ok(Self::new(
            Orchestrator::new(generator, config.orchestrator.clone()),
            Arc::new(store),
        )
        .with_upload_retry(
            RetryPolicy::from(&config.orchestrator),
            Arc::new(TokioSleeper),
        ))
    }
}

impl<G: ImageGenerator, S: Sleeper> Pipeline<G, S> {
    pub fn new(orchestrator: Orchestrator<G, S>, store: Arc<dyn AssetStore>) -> Self {
        Self {
            prompts: PromptBuilder::new(),
            orchestrator,
            store,
            upload_retry: RetryPolicy::default().single_attempt(),
            upload_sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Storage writes are single-shot unless configured here.
    pub fn with_upload_retry(mut self, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        self.upload_retry = policy;
        self.upload_sleeper = sleeper;
        self
    }

    pub async fn execute(&self, input: &WorkflowInput) -> Result<PublishedAngles> {
        let request = input.to_request()?;
        let publisher = Publisher::new(self.store.clone(), &input.user_id, &input.resource_id)?
            .with_retry(self.upload_retry.clone(), self.upload_sleeper.clone());

        log::info!(
            "Generating {} for user {} ({} reference images)",
            input.resource_id,
            input.user_id,
            request.reference_images.len()
        );

        let prompts = self.prompts.build_angles(&request);
        let angles = self.orchestrator.generate_all_angles(&prompts).await?;
        let uploads = publisher.publish_all(&angles).await?;
        PublishedAngles::from_uploads(&uploads)
    }

    /// Never fails: errors become a `success: false` record.
    pub async fn run(&self, input: &WorkflowInput) -> WorkflowOutput {
        match self.execute(input).await {
            Ok(result) => WorkflowOutput::ok(result),
            Err(e) => {
                log::error!("Workflow for {} failed: {}", input.resource_id, e);
                WorkflowOutput::failed(e)
            }
        }
    }

    /// Like [`run`](Self::run) but starting from the raw JSON record.
    pub async fn run_json(&self, raw: &str) -> WorkflowOutput {
        match serde_json::from_str::<WorkflowInput>(raw) {
            Ok(input) => self.run(&input).await,
            Err(e) => {
                log::error!("Invalid workflow input: {}", e);
                WorkflowOutput::failed(format!("Invalid workflow input: {}", e))
            }
        }
    }
}

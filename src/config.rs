use std::env;
use std::time::Duration;

use crate::error::{Result, StudioError};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BUCKET: &str = "generations";

/// Per-call timeout for every external request. Not caller-configurable.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub bucket: String,
}

/// What to do when back/face is requested but no front image exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePolicy {
    /// Fail with `MissingFrontImage` before calling the API.
    Require,
    /// Log a warning and generate without an identity reference.
    Degrade,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_attempts: u32,
    pub step_delay: Duration,
    pub unavailable_backoff: Duration,
    pub empty_backoff: Duration,
    pub reference_policy: ReferencePolicy,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub storage: StorageConfig,
    pub orchestrator: OrchestratorConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: 0.4,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        GeminiConfig {
            api_key: env::var("GEMINI_API_KEY").ok(),
            model: env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            temperature: env::var("GEMINI_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            url: None,
            service_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        StorageConfig {
            url: env::var("SUPABASE_URL").ok(),
            service_key: env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
            bucket: env::var("SUPABASE_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
        }
    }

    pub fn with_credentials(mut self, url: impl Into<String>, service_key: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.service_key = Some(service_key.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Project URL without a trailing slash, or a config error when unset.
    pub fn base_url(&self) -> Result<String> {
        self.url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| StudioError::Config("SUPABASE_URL is required".into()))
    }

    pub fn key(&self) -> Result<&str> {
        self.service_key
            .as_deref()
            .ok_or_else(|| StudioError::Config("SUPABASE_SERVICE_ROLE_KEY is required".into()))
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            max_attempts: 3,
            step_delay: Duration::from_secs(2),
            unavailable_backoff: Duration::from_secs(5),
            empty_backoff: Duration::from_secs(3),
            reference_policy: ReferencePolicy::Require,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let reference_policy = match env::var("VIZZU_REFERENCE_POLICY").ok().as_deref() {
            Some("degrade") => ReferencePolicy::Degrade,
            _ => ReferencePolicy::Require,
        };
        OrchestratorConfig {
            reference_policy,
            ..Self::default()
        }
    }

    pub fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            gemini: GeminiConfig::from_env(),
            storage: StorageConfig::from_env(),
            orchestrator: OrchestratorConfig::from_env(),
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }

    pub fn with_orchestrator(mut self, config: OrchestratorConfig) -> Self {
        self.orchestrator = config;
        self
    }
}

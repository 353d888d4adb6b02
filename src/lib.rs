//! Multi-angle AI fashion photography.
//!
//! A [`GenerationRequest`] is turned into prompts by the [`PromptBuilder`], the
//! [`Orchestrator`] generates front, back and face images against Gemini with
//! retry and fallback, and the [`Publisher`] uploads the results to Supabase
//! Storage. [`Pipeline`] wires the three together for one workflow record.

pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod plans;
pub mod prompt;
pub mod retry;
pub mod storage;

pub use config::{Config, GeminiConfig, OrchestratorConfig, ReferencePolicy, StorageConfig};
pub use error::{Result, StudioError};
pub use gemini::{GeminiClient, GeneratedImage, ImageGenerator};
pub use models::*;
pub use orchestrator::Orchestrator;
pub use pipeline::Pipeline;
pub use plans::{Plan, PlanCatalog, PlanSource, SupabasePlanSource};
pub use prompt::PromptBuilder;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use storage::{AssetStore, Publisher, SupabaseStore};

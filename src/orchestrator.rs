use crate::{
    config::{OrchestratorConfig, ReferencePolicy},
    error::{Result, StudioError},
    gemini::ImageGenerator,
    logger,
    models::{Angle, AngleImage, AnglePrompts, AngleSet, Part, PromptResult},
    retry::{RetryExecutor, RetryPolicy, Sleeper, TokioSleeper},
};

const IDENTITY_INSTRUCTION: &str = "IDENTITY REFERENCE: the last image shows the model from the \
front view. Keep exactly the same person (face, hairstyle, skin tone, body proportions) and the \
same outfit.";

/// Runs the front → back → face sequence against an [`ImageGenerator`].
pub struct Orchestrator<G, S = TokioSleeper> {
    generator: G,
    sleeper: S,
    config: OrchestratorConfig,
}

impl<G: ImageGenerator> Orchestrator<G, TokioSleeper> {
    pub fn new(generator: G, config: OrchestratorConfig) -> Self {
        Self::with_sleeper(generator, TokioSleeper, config)
    }
}

impl<G: ImageGenerator, S: Sleeper> Orchestrator<G, S> {
    pub fn with_sleeper(generator: G, sleeper: S, config: OrchestratorConfig) -> Self {
        Self {
            generator,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Generate a single angle.
    ///
    /// `reference` is the front image used as identity anchor for back/face.
    /// When `include_auxiliary` is false the prompt's own image parts are
    /// dropped and only its text is sent. A reference-guided call that exhausts
    /// its retries gets exactly one more call with the reference omitted.
    pub async fn generate_angle(
        &self,
        prompt: &PromptResult,
        angle: Angle,
        reference: Option<&AngleImage>,
        include_auxiliary: bool,
    ) -> Result<AngleImage> {
        if let Some(reference) = reference {
            if reference.angle != Angle::Front {
                return Err(StudioError::Request(format!(
                    "identity reference for {} must be the front image, got {}",
                    angle, reference.angle
                )));
            }
        } else if angle.needs_identity_anchor() {
            match self.config.reference_policy {
                ReferencePolicy::Require => {
                    return Err(StudioError::MissingFrontImage { angle });
                }
                ReferencePolicy::Degrade => {
                    log::warn!(
                        "No front image available, generating {} without identity reference",
                        angle
                    );
                }
            }
        }

        let policy = RetryPolicy::from(&self.config);
        let parts = request_parts(prompt, reference, include_auxiliary);
        let guided = RetryExecutor::new(policy.clone(), &self.sleeper)
            .execute(angle, || self.generator.generate(&parts))
            .await;

        match (guided, reference) {
            (Ok(image), _) => Ok(image),
            (Err(e), None) => Err(e),
            (Err(e), Some(_)) => {
                log::warn!(
                    "Reference-guided {} generation failed ({}), retrying once without reference",
                    angle,
                    e
                );
                let parts = request_parts(prompt, None, include_auxiliary);
                RetryExecutor::new(policy.single_attempt(), &self.sleeper)
                    .execute(angle, || self.generator.generate(&parts))
                    .await
            }
        }
    }

    /// Front first, then back and face anchored on front, one after another.
    pub async fn generate_all_angles(&self, prompts: &AnglePrompts) -> Result<AngleSet> {
        let front = {
            let _timer = logger::timer("front generation");
            self.generate_angle(&prompts.front, Angle::Front, None, true)
                .await?
        };
        log::info!("Front image ready ({} bytes)", front.bytes.len());

        self.sleeper.sleep(self.config.step_delay).await;
        let back = {
            let _timer = logger::timer("back generation");
            self.generate_angle(&prompts.back, Angle::Back, Some(&front), true)
                .await?
        };
        log::info!("Back image ready ({} bytes)", back.bytes.len());

        self.sleeper.sleep(self.config.step_delay).await;
        let face = {
            let _timer = logger::timer("face generation");
            self.generate_angle(&prompts.face, Angle::Face, Some(&front), true)
                .await?
        };
        log::info!("Face image ready ({} bytes)", face.bytes.len());

        Ok(AngleSet { front, back, face })
    }
}

fn request_parts(
    prompt: &PromptResult,
    reference: Option<&AngleImage>,
    include_auxiliary: bool,
) -> Vec<Part> {
    let mut parts: Vec<Part> = prompt
        .parts
        .iter()
        .filter(|part| include_auxiliary || !part.is_image())
        .cloned()
        .collect();
    if let Some(reference) = reference {
        parts.push(Part::text(IDENTITY_INSTRUCTION));
        parts.push(Part::image(&reference.bytes, reference.mime_type.clone()));
    }
    parts
}

//! Per-call retry policy.
//!
//! Each attempt is classified into an [`Outcome`], and the pure [`next_action`]
//! decides whether to retry (and after how long), succeed, or give up.
//! [`RetryExecutor`] drives that machine against a real call, sleeping through a
//! [`Sleeper`] so tests can record delays instead of waiting.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::{
    config::OrchestratorConfig,
    error::{Result, StudioError},
    gemini::GeneratedImage,
    models::{Angle, AngleImage},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub unavailable_backoff: Duration,
    pub empty_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}

impl From<&OrchestratorConfig> for RetryPolicy {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            unavailable_backoff: config.unavailable_backoff,
            empty_backoff: config.empty_backoff,
        }
    }
}

impl RetryPolicy {
    /// A single attempt with no retries.
    pub fn single_attempt(&self) -> Self {
        Self {
            max_attempts: 1,
            ..self.clone()
        }
    }
}

/// Classified result of one attempt.
#[derive(Debug)]
pub enum Outcome {
    Image(AngleImage),
    Unavailable(StudioError),
    NoImage(Angle),
    Failed(StudioError),
}

impl Outcome {
    pub fn classify(angle: Angle, result: Result<Option<GeneratedImage>>) -> Self {
        match result {
            Ok(Some(image)) => Outcome::Image(AngleImage::new(angle, image.bytes, image.mime_type)),
            Ok(None) => Outcome::NoImage(angle),
            Err(e) if e.is_transient() => Outcome::Unavailable(e),
            Err(e) => Outcome::Failed(e),
        }
    }
}

#[derive(Debug)]
pub enum Action {
    Retry(Duration),
    Succeed(AngleImage),
    Fail(StudioError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// 1-based attempt number in flight.
    Attempting(u32),
    Succeeded,
    FailedTerminal,
}

impl RetryState {
    pub fn start() -> Self {
        RetryState::Attempting(1)
    }

    pub fn advance(self, action: &Action) -> Self {
        match (self, action) {
            (RetryState::Attempting(n), Action::Retry(_)) => RetryState::Attempting(n + 1),
            (RetryState::Attempting(_), Action::Succeed(_)) => RetryState::Succeeded,
            (RetryState::Attempting(_), Action::Fail(_)) => RetryState::FailedTerminal,
            (terminal, _) => terminal,
        }
    }
}

/// Decide what follows `outcome` on the 1-based `attempt`.
pub fn next_action(policy: &RetryPolicy, outcome: Outcome, attempt: u32) -> Action {
    let attempts_left = attempt < policy.max_attempts;
    match outcome {
        Outcome::Image(image) => Action::Succeed(image),
        Outcome::Unavailable(_) if attempts_left => {
            Action::Retry(policy.unavailable_backoff * attempt)
        }
        Outcome::NoImage(_) if attempts_left => Action::Retry(policy.empty_backoff * attempt),
        Outcome::Failed(_) if attempts_left => Action::Retry(policy.unavailable_backoff * attempt),
        Outcome::NoImage(angle) => Action::Fail(StudioError::EmptyResult { angle }),
        Outcome::Unavailable(e) | Outcome::Failed(e) => Action::Fail(e),
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct RetryExecutor<'a, S: Sleeper + ?Sized> {
    policy: RetryPolicy,
    sleeper: &'a S,
}

impl<'a, S: Sleeper + ?Sized> RetryExecutor<'a, S> {
    pub fn new(policy: RetryPolicy, sleeper: &'a S) -> Self {
        Self { policy, sleeper }
    }

    pub async fn execute<F, Fut>(&self, angle: Angle, mut call: F) -> Result<AngleImage>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<GeneratedImage>>>,
    {
        let mut state = RetryState::start();
        loop {
            let RetryState::Attempting(attempt) = state else {
                return Err(StudioError::Internal(format!(
                    "retry loop for {} reached {:?} without a result",
                    angle, state
                )));
            };

            let outcome = Outcome::classify(angle, call().await);
            let action = next_action(&self.policy, outcome, attempt);
            state = state.advance(&action);

            match action {
                Action::Succeed(image) => return Ok(image),
                Action::Fail(e) => {
                    log::error!("{} generation failed on attempt {}: {}", angle, attempt, e);
                    return Err(e);
                }
                Action::Retry(delay) => {
                    log::warn!(
                        "{} attempt {}/{} did not produce an image, retrying in {}ms",
                        angle,
                        attempt,
                        self.policy.max_attempts,
                        delay.as_millis()
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn unavailable() -> Outcome {
        Outcome::Unavailable(StudioError::Upstream {
            status: 503,
            message: "overloaded".into(),
        })
    }

    fn image() -> Outcome {
        Outcome::Image(AngleImage::new(Angle::Front, vec![1], "image/png"))
    }

    #[test]
    fn test_unavailable_backoff_scales_with_attempt() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            next_action(&policy, unavailable(), 1),
            Action::Retry(d) if d == Duration::from_millis(5000)
        ));
        assert!(matches!(
            next_action(&policy, unavailable(), 2),
            Action::Retry(d) if d == Duration::from_millis(10000)
        ));
        assert!(matches!(
            next_action(&policy, unavailable(), 3),
            Action::Fail(StudioError::Upstream { status: 503, .. })
        ));
    }

    #[test]
    fn test_empty_result_uses_shorter_backoff() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            next_action(&policy, Outcome::NoImage(Angle::Back), 1),
            Action::Retry(d) if d == Duration::from_secs(3)
        ));
        assert!(matches!(
            next_action(&policy, Outcome::NoImage(Angle::Back), 2),
            Action::Retry(d) if d == Duration::from_secs(6)
        ));
        assert!(matches!(
            next_action(&policy, Outcome::NoImage(Angle::Back), 3),
            Action::Fail(StudioError::EmptyResult { angle: Angle::Back })
        ));
    }

    #[test]
    fn test_hard_failure_propagates_on_final_attempt() {
        let policy = RetryPolicy::default();
        let failed = || Outcome::Failed(StudioError::Request("connection reset".into()));
        assert!(matches!(
            next_action(&policy, failed(), 2),
            Action::Retry(d) if d == Duration::from_secs(10)
        ));
        assert!(matches!(
            next_action(&policy, failed(), 3),
            Action::Fail(StudioError::Request(_))
        ));
    }

    #[test]
    fn test_image_always_succeeds() {
        let policy = RetryPolicy::default();
        assert!(matches!(next_action(&policy, image(), 3), Action::Succeed(_)));
    }

    #[test]
    fn test_state_transitions() {
        let state = RetryState::start();
        let state = state.advance(&Action::Retry(Duration::from_secs(1)));
        assert_eq!(state, RetryState::Attempting(2));
        let done = state.advance(&Action::Fail(StudioError::Internal("x".into())));
        assert_eq!(done, RetryState::FailedTerminal);
        assert_eq!(
            done.advance(&Action::Retry(Duration::ZERO)),
            RetryState::FailedTerminal
        );
    }

    #[derive(Default)]
    struct RecordingSleeper(Mutex<Vec<Duration>>);

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_executor_gives_up_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let executor = RetryExecutor::new(RetryPolicy::default(), &sleeper);
        let mut calls = 0;
        let result = executor
            .execute(Angle::Face, || {
                calls += 1;
                async { Ok(None) }
            })
            .await;
        assert!(matches!(result, Err(StudioError::EmptyResult { angle: Angle::Face })));
        assert_eq!(calls, 3);
        assert_eq!(
            *sleeper.0.lock().unwrap(),
            vec![Duration::from_secs(3), Duration::from_secs(6)]
        );
    }
}

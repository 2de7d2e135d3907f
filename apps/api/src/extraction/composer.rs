//! Fallback composer: one attempt at the LLM, then validation, then fallback.
//!
//! State flow per request:
//!   ATTEMPT_EXTERNAL → VALIDATE → ACCEPT
//!                   ↘           ↘ FALLBACK
//!
//! The LLM is an opaque collaborator. Missing configuration skips it, and any
//! error, timeout or gate rejection moves to FALLBACK. None of these reach the
//! caller: a request always gets a result.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::llm_client::signature::{Prediction, Signature};
use crate::llm_client::{Generator, LlmClient, LlmError};
use crate::quality::gate::Rejection;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a request ended on the fallback path.
#[derive(Debug, Error)]
pub enum FallbackReason {
    #[error("no LLM credential configured")]
    ConfigurationMissing,

    #[error("external call failed: {0}")]
    ExternalCall(String),

    #[error("quality gate rejected output: {0}")]
    QualityRejected(#[from] Rejection),
}

impl From<LlmError> for FallbackReason {
    fn from(e: LlmError) -> Self {
        FallbackReason::ExternalCall(e.to_string())
    }
}

/// Owns the (optional) generator and runs every feature's call-with-fallback.
pub struct ContentComposer {
    generator: Option<Arc<dyn Generator>>,
    timeout: Duration,
}

impl ContentComposer {
    pub fn new(generator: Option<Arc<dyn Generator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Builds the production composer. Mock mode is decided here, once.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match &config.llm {
            Some(settings) => {
                let client = LlmClient::new(settings)?;
                info!(
                    "LLM client initialized (provider: {}, model: {})",
                    settings.provider.as_str(),
                    client.model()
                );
                let generator: Arc<dyn Generator> = Arc::new(client);
                Ok(Self::new(Some(generator), settings.timeout))
            }
            None => {
                warn!("No LLM API key configured, running in mock mode");
                Ok(Self::new(None, DEFAULT_TIMEOUT))
            }
        }
    }

    pub fn is_mock_mode(&self) -> bool {
        self.generator.is_none()
    }

    /// ATTEMPT_EXTERNAL: one bounded call. Never panics, never propagates.
    pub async fn attempt(
        &self,
        signature: &Signature,
        inputs: &[(&str, String)],
    ) -> Result<Prediction, FallbackReason> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(FallbackReason::ConfigurationMissing)?;

        match tokio::time::timeout(self.timeout, generator.predict(signature, inputs)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(FallbackReason::ExternalCall(format!(
                "timed out after {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

/// Logs the transition to FALLBACK at a level matching its cause.
pub fn log_fallback(feature: &str, reason: &FallbackReason) {
    match reason {
        FallbackReason::ConfigurationMissing => {
            tracing::debug!("{feature}: mock mode, using fallback")
        }
        FallbackReason::ExternalCall(msg) => {
            tracing::error!("{feature}: LLM call failed, using fallback: {msg}")
        }
        FallbackReason::QualityRejected(rejection) => {
            warn!("{feature}: LLM output rejected, using fallback: {rejection}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::extraction::prompts::MEMORABLE_TITLE;
    use crate::llm_client::testing::{Script, ScriptedGenerator};

    fn composer(script: Script) -> ContentComposer {
        let generator: Arc<dyn Generator> = Arc::new(ScriptedGenerator::new(script));
        ContentComposer::new(Some(generator), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_missing_generator_skips_call() {
        let composer = ContentComposer::new(None, DEFAULT_TIMEOUT);
        assert!(composer.is_mock_mode());
        let err = composer.attempt(&MEMORABLE_TITLE, &[]).await.unwrap_err();
        assert!(matches!(err, FallbackReason::ConfigurationMissing));
    }

    #[tokio::test]
    async fn test_reply_is_returned() {
        let composer = composer(Script::Reply(json!({"title": "Walnut desk build"})));
        let prediction = composer.attempt(&MEMORABLE_TITLE, &[]).await.unwrap();
        assert_eq!(prediction.text("title").as_deref(), Some("Walnut desk build"));
    }

    #[tokio::test]
    async fn test_generator_error_becomes_external_call() {
        let composer = composer(Script::Fail);
        let err = composer.attempt(&MEMORABLE_TITLE, &[]).await.unwrap_err();
        match err {
            FallbackReason::ExternalCall(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("unexpected reason: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_generator_times_out() {
        let composer = composer(Script::Hang);
        let err = composer.attempt(&MEMORABLE_TITLE, &[]).await.unwrap_err();
        match err {
            FallbackReason::ExternalCall(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected reason: {other:?}"),
        }
    }

    #[test]
    fn test_from_config_without_key_is_mock() {
        let config = Config::from_lookup(|_| None).unwrap();
        let composer = ContentComposer::from_config(&config).unwrap();
        assert!(composer.is_mock_mode());
    }

    #[test]
    fn test_rejection_converts() {
        let reason: FallbackReason = Rejection("too short".to_string()).into();
        assert_eq!(reason.to_string(), "quality gate rejected output: too short");
    }
}

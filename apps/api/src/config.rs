use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Origins allowed by CORS when `ALLOWED_ORIGINS` is not set.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:3001"];
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The OpenAI-compatible backends the service knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Zhipu,
    OpenAi,
    Together,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Zhipu => "zhipu",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Together => "together",
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            LlmProvider::Zhipu => "ZHIPU_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Together => "TOGETHER_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Zhipu => "glm-4",
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Together => "zai-org/GLM-4.7",
        }
    }

    fn default_api_base(&self) -> &'static str {
        match self {
            LlmProvider::Zhipu => "https://api.z.ai/api/coding/paas/v4",
            LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::Together => "https://api.together.xyz/v1",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zhipu" => Ok(LlmProvider::Zhipu),
            "openai" => Ok(LlmProvider::OpenAi),
            "together" => Ok(LlmProvider::Together),
            other => bail!("Unknown LLM_PROVIDER '{other}' (expected zhipu, openai or together)"),
        }
    }
}

/// Everything needed to reach the LLM backend. Only present when a credential is set.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

/// Application configuration loaded from environment variables.
///
/// A missing LLM credential is not an error: `llm` is `None` and the service
/// runs in mock mode, answering every request from the rule-based fallbacks.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: LlmProvider,
    pub llm: Option<LlmSettings>,
    pub port: u16,
    pub rust_log: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("LLM_PROVIDER") {
            Some(raw) => raw.parse::<LlmProvider>()?,
            None => LlmProvider::Zhipu,
        };

        let timeout_secs = match var("LLM_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("LLM_TIMEOUT_SECS must be greater than zero");
        }

        let llm = var(provider.key_var()).map(|api_key| LlmSettings {
            provider,
            api_key,
            model: var("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            api_base: var("LLM_API_BASE")
                .unwrap_or_else(|| provider.default_api_base().to_string()),
            timeout: Duration::from_secs(timeout_secs),
        });

        let allowed_origins = match var("ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
        };

        Ok(Config {
            provider,
            llm,
            port: var("PORT")
                .unwrap_or_else(|| "7860".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            allowed_origins,
        })
    }

    /// Model name reported by `/health`, even in mock mode.
    pub fn model_name(&self) -> &str {
        self.llm
            .as_ref()
            .map(|s| s.model.as_str())
            .unwrap_or_else(|| self.provider.default_model())
    }
}

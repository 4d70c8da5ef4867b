//! LLM provider configuration.
//!
//! The analysis model is selected either from a `[llm]` table in a TOML
//! config file or from the `README_SYNC_LLM_MODEL` environment spec
//! (e.g. `anthropic:claude-3-5-sonnet-20241022`).

use super::error::AnalysisError;
use serde::Deserialize;
use serdes_ai_models::{build_model_with_config, infer_model, openrouter::OpenRouterModel, Model};
use std::path::Path;
use std::sync::Arc;

pub(crate) const MODEL_ENV: &str = "README_SYNC_LLM_MODEL";
pub(crate) const TEMPERATURE_ENV: &str = "README_SYNC_LLM_TEMPERATURE";

/// Top-level structure for `config.toml` with a single `[llm]` section.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    llm: ModelConfig,
}

/// Provider-specific model configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ModelConfig {
    /// OpenAI provider.
    #[serde(rename = "openai")]
    OpenAi {
        /// Model name (e.g., "gpt-4o").
        model: String,
        /// API key; falls back to `OPENAI_API_KEY`.
        api_key: Option<String>,
        /// Base URL override.
        #[serde(rename = "base-url")]
        base_url: Option<String>,
        /// Request timeout in seconds.
        #[serde(rename = "timeout-secs")]
        timeout_secs: Option<u64>,
        /// Sampling temperature.
        temperature: Option<f64>,
    },

    /// OpenRouter provider.
    OpenRouter {
        /// Model name (e.g., "anthropic/claude-3-opus").
        model: String,
        /// API key; falls back to `OPENROUTER_API_KEY`.
        api_key: Option<String>,
        /// HTTP Referer header.
        #[serde(rename = "http-referer")]
        http_referer: Option<String>,
        /// App title header.
        #[serde(rename = "app-title")]
        app_title: Option<String>,
        /// Sampling temperature.
        temperature: Option<f64>,
    },

    /// Anthropic provider.
    Anthropic {
        /// Model name (e.g., "claude-3-5-sonnet-20241022").
        model: String,
        /// API key; falls back to `ANTHROPIC_API_KEY`.
        api_key: Option<String>,
        /// Base URL override.
        #[serde(rename = "base-url")]
        base_url: Option<String>,
        /// Request timeout in seconds.
        #[serde(rename = "timeout-secs")]
        timeout_secs: Option<u64>,
        /// Sampling temperature.
        temperature: Option<f64>,
    },

    /// Gemini provider.
    Gemini {
        /// Model name (e.g., "gemini-2.0-flash").
        model: String,
        /// API key; falls back to `GOOGLE_API_KEY`.
        api_key: Option<String>,
        /// Base URL override.
        #[serde(rename = "base-url")]
        base_url: Option<String>,
        /// Request timeout in seconds.
        #[serde(rename = "timeout-secs")]
        timeout_secs: Option<u64>,
        /// Sampling temperature.
        temperature: Option<f64>,
    },
}

impl ModelConfig {
    /// Returns the configured sampling temperature, if any.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        match self {
            Self::OpenAi { temperature, .. }
            | Self::OpenRouter { temperature, .. }
            | Self::Anthropic { temperature, .. }
            | Self::Gemini { temperature, .. } => *temperature,
        }
    }

    /// Builds a model handle from this configuration.
    pub fn build_model(&self) -> Result<Arc<dyn Model>, AnalysisError> {
        match self {
            Self::OpenRouter {
                model,
                api_key,
                http_referer,
                app_title,
                ..
            } => {
                if api_key.is_none() && http_referer.is_none() && app_title.is_none() {
                    let spec = format!("openrouter:{model}");
                    return infer_model(&spec).map_err(AnalysisError::Model);
                }
                let mut built = match api_key {
                    Some(key) => OpenRouterModel::new(model, key),
                    None => OpenRouterModel::from_env(model).map_err(AnalysisError::Model)?,
                };
                if let Some(referer) = http_referer {
                    built = built.with_http_referer(referer);
                }
                if let Some(title) = app_title {
                    built = built.with_app_title(title);
                }
                Ok(Arc::new(built))
            }
            Self::OpenAi {
                model,
                api_key,
                base_url,
                timeout_secs,
                ..
            } => build_provider_model("openai", model, api_key, base_url, timeout_secs),
            Self::Anthropic {
                model,
                api_key,
                base_url,
                timeout_secs,
                ..
            } => build_provider_model("anthropic", model, api_key, base_url, timeout_secs),
            Self::Gemini {
                model,
                api_key,
                base_url,
                timeout_secs,
                ..
            } => build_provider_model("gemini", model, api_key, base_url, timeout_secs),
        }
    }
}

/// Builds a model for providers that share the key/base-url/timeout shape.
fn build_provider_model(
    provider: &str,
    model: &str,
    api_key: &Option<String>,
    base_url: &Option<String>,
    timeout_secs: &Option<u64>,
) -> Result<Arc<dyn Model>, AnalysisError> {
    let resolved_key = api_key
        .as_deref()
        .map(str::to_owned)
        .or_else(|| env_api_key(provider));
    if resolved_key.is_none() && base_url.is_none() && timeout_secs.is_none() {
        let spec = format!("{provider}:{model}");
        return infer_model(&spec).map_err(AnalysisError::Model);
    }
    let timeout = timeout_secs.map(core::time::Duration::from_secs);
    build_model_with_config(
        provider,
        model,
        resolved_key.as_deref(),
        base_url.as_deref(),
        timeout,
    )
    .map_err(AnalysisError::Model)
}

/// Gets the conventional API key env var for a provider.
fn env_api_key(provider: &str) -> Option<String> {
    let var = match provider {
        "openai" => "OPENAI_API_KEY",
        "anthropic" => "ANTHROPIC_API_KEY",
        "gemini" => "GOOGLE_API_KEY",
        _ => return None,
    };
    std::env::var(var).ok()
}

/// Loads the `[llm]` config table if the file exists.
pub(crate) fn load_config(path: &Path) -> Result<Option<ModelConfig>, AnalysisError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| AnalysisError::Toml {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(parsed.llm))
}

/// Resolves the model from config, falling back to the env spec.
pub(crate) fn resolve_model(
    config: Option<&ModelConfig>,
) -> Result<Arc<dyn Model>, AnalysisError> {
    if let Some(config) = config {
        return config.build_model();
    }
    let spec = std::env::var(MODEL_ENV).map_err(|_| AnalysisError::MissingModel)?;
    infer_model(&spec).map_err(AnalysisError::Model)
}

/// Resolves the temperature; the env var takes precedence over config.
pub(crate) fn resolve_temperature(config: Option<&ModelConfig>) -> Option<f64> {
    if let Ok(val) = std::env::var(TEMPERATURE_ENV) {
        if let Ok(temp) = val.parse::<f64>() {
            return validate_temperature(temp, "environment variable");
        }
    }
    config
        .and_then(ModelConfig::temperature)
        .and_then(|t| validate_temperature(t, "config file"))
}

/// Rejects non-finite or out-of-range temperatures.
fn validate_temperature(value: f64, source: &str) -> Option<f64> {
    if !value.is_finite() || !(0.0..=2.0).contains(&value) {
        tracing::warn!(
            "Invalid temperature {value} from {source}: must be finite and in range 0.0-2.0"
        );
        return None;
    }
    Some(value)
}

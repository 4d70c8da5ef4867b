//! Analysis error types.

use thiserror::Error;

/// Errors raised while invoking the model service.
///
/// Parse failures are not errors: they are recovered into an
/// [`AnalysisResult`](super::AnalysisResult) with `parse_error` set.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Failed to read the LLM config file.
    #[error("Failed to read LLM config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the LLM config file.
    #[error("Failed to parse LLM config '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// No model configured.
    #[error("LLM model not configured; set README_SYNC_LLM_MODEL or config.toml")]
    MissingModel,

    /// The model call exceeded its deadline.
    #[error("Model call timed out after {0} seconds")]
    Timeout(u64),

    /// Model construction error.
    #[error("Model error: {0}")]
    Model(#[from] serdes_ai_models::ModelError),

    /// Model invocation error.
    #[error("Agent run error: {0}")]
    AgentRun(#[from] serdes_ai::agent::AgentRunError),
}

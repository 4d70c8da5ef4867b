//! Documentation analysis via the model service.
//!
//! This module owns the single point of external non-determinism in the
//! pipeline: one model invocation per delivery, with the raw reply always
//! funneled through the [`parser`] so unvalidated structure never escapes.

mod config;
mod error;
pub mod parser;
mod result;

pub use config::ModelConfig;
pub use error::AnalysisError;
pub use result::{AnalysisResult, Priority, Suggestion, SuggestionKind};

use crate::github::PullRequestContext;
use serdes_ai::agent::{Agent, AgentBuilder};
use serdes_ai_models::Model;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Ceiling for the model call, well under the delivery deadline.
const MODEL_TIMEOUT_SECS: u64 = 180;

/// Diffs beyond this many bytes are truncated before prompting.
const MAX_DIFF_BYTES: usize = 60 * 1024;

/// Sampling temperature used when none is configured; near-deterministic.
const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Client for the documentation-relevance analysis.
#[derive(Clone)]
pub struct AnalysisClient {
    model: Arc<dyn Model>,
    temperature: f64,
}

impl AnalysisClient {
    /// Creates a client over an already-built model handle.
    #[must_use]
    pub fn new(model: Arc<dyn Model>, temperature: Option<f64>) -> Self {
        Self {
            model,
            temperature: temperature.unwrap_or(DEFAULT_TEMPERATURE),
        }
    }

    /// Creates a client from the `[llm]` config file at `path`, falling
    /// back to the `README_SYNC_LLM_MODEL` env spec when the file is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if no model is configured or the config
    /// file is unreadable.
    pub fn from_config_path(path: &Path) -> Result<Self, AnalysisError> {
        let config = config::load_config(path)?;
        let model = config::resolve_model(config.as_ref())?;
        let temperature = config::resolve_temperature(config.as_ref());
        Ok(Self::new(model, temperature))
    }

    /// Asks the model whether the README needs updating for this PR.
    ///
    /// Invokes the model once and delegates the raw reply to
    /// [`parser::parse`]. A malformed reply comes back as a result with
    /// `parse_error` set; only transport-level failures (timeout, model
    /// error) surface as [`AnalysisError`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] when the model call itself fails.
    pub async fn analyze(
        &self,
        context: &PullRequestContext,
        readme: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let prompt = build_prompt(context, readme);
        debug!(prompt_bytes = prompt.len(), "Invoking analysis model");

        let agent: Agent<(), String> = AgentBuilder::from_arc(Arc::clone(&self.model))
            .temperature(self.temperature)
            .build();

        let raw: String = tokio::time::timeout(
            tokio::time::Duration::from_secs(MODEL_TIMEOUT_SECS),
            agent.run(prompt, ()),
        )
        .await
        .map_err(|_| AnalysisError::Timeout(MODEL_TIMEOUT_SECS))?
        .map_err(AnalysisError::from)?
        .into_output();

        let result = parser::parse(&raw);
        info!(
            needs_update = result.needs_update,
            suggestions = result.suggestions.len(),
            parse_error = result.parse_error.is_some(),
            "Analysis complete"
        );
        Ok(result)
    }
}

/// Builds the contextual prompt for one analysis.
fn build_prompt(context: &PullRequestContext, readme: &str) -> String {
    let changed_files = if context.changed_files.is_empty() {
        "(none reported)".to_string()
    } else {
        context
            .changed_files
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let readme_block = if readme.is_empty() {
        "(the repository has no README yet)".to_string()
    } else {
        readme.to_string()
    };

    format!(
        "You are reviewing a pull request to decide whether the repository README \
needs updating.\n\
\n\
Repository: {full_name}\n\
Pull request #{number}: {title}\n\
Description: {description}\n\
Commits: {commit_count}\n\
\n\
Changed files:\n{changed_files}\n\
\n\
Current README:\n\
---\n{readme_block}\n---\n\
\n\
Diff:\n\
---\n{diff}\n---\n\
\n\
A change is documentation-relevant when it adds or alters: environment \
variables, dependencies, user-facing features, setup or installation steps, \
public APIs, architecture, file structure, scripts, or anything breaking.\n\
\n\
Be conservative: only flag changes the current README does not already \
cover. Respond with ONLY a JSON object, no prose, in exactly this shape:\n\
{{\"needsUpdate\": boolean, \"suggestions\": [{{\"kind\": \
\"environment-variable|dependency|feature|setup|api|architecture|other\", \
\"targetSection\": \"<heading name, or 'new section', or 'after <heading>'>\", \
\"description\": \"<why this change is needed>\", \
\"priority\": \"high|medium|low\", \
\"body\": \"<the literal markdown to insert, including any heading line>\"}}]}}",
        full_name = context.full_name(),
        number = context.number,
        title = context.title,
        description = if context.description.is_empty() {
            "(none)"
        } else {
            &context.description
        },
        commit_count = context.commit_count,
        diff = truncate_diff(&context.diff),
    )
}

/// Truncates oversized diffs at a char boundary, marking the cut.
fn truncate_diff(diff: &str) -> String {
    if diff.len() <= MAX_DIFF_BYTES {
        return diff.to_string();
    }
    let mut end = MAX_DIFF_BYTES;
    while !diff.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n[diff truncated]", &diff[..end])
}

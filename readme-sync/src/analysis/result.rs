//! Analysis result and suggestion types.

use serde::{Deserialize, Serialize};

/// Category of documentation change a suggestion addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    /// Environment variable added, removed or renamed.
    EnvironmentVariable,

    /// Dependency added, removed or upgraded.
    Dependency,

    /// New user-facing feature.
    Feature,

    /// Setup or installation step change.
    Setup,

    /// Public API change.
    Api,

    /// Architectural change.
    Architecture,

    /// Anything else worth documenting.
    #[serde(other)]
    Other,
}

impl SuggestionKind {
    /// Returns a human-readable label for reports and commit messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::EnvironmentVariable => "environment variable",
            Self::Dependency => "dependency",
            Self::Feature => "feature",
            Self::Setup => "setup",
            Self::Api => "API",
            Self::Architecture => "architecture",
            Self::Other => "other",
        }
    }
}

/// How urgent a suggestion is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Documentation is wrong or misleading without this change.
    High,

    /// Documentation is incomplete without this change.
    Medium,

    /// Nice to have.
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Priority {
    /// Returns the priority as a lowercase string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// One proposed README change.
///
/// Only [`body`](Self::body) ever reaches the document; every other field is
/// metadata for the status comment and the commit message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Category of the change.
    #[serde(default = "default_kind")]
    pub kind: SuggestionKind,

    /// README heading to update, or the directives "new section" /
    /// "after <heading>".
    #[serde(default)]
    pub target_section: String,

    /// Human-readable rationale. Never inserted into the document.
    #[serde(default)]
    pub description: String,

    /// Urgency of the change.
    #[serde(default)]
    pub priority: Priority,

    /// Literal markdown to insert or replace. Empty means no-op.
    #[serde(default)]
    pub body: String,
}

fn default_kind() -> SuggestionKind {
    SuggestionKind::Other
}

/// Outcome of one model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Whether the README needs updating for this diff.
    pub needs_update: bool,

    /// Ordered suggestions; merge applies them left to right.
    pub suggestions: Vec<Suggestion>,

    /// Diagnostic recorded when the raw model output failed validation.
    /// When set, `needs_update` is `false` and `suggestions` is empty.
    pub parse_error: Option<String>,
}

impl AnalysisResult {
    /// Builds the degraded result for unparseable model output.
    ///
    /// A parse failure must never masquerade as a verified "no changes
    /// needed", so the diagnostic travels with the result.
    #[must_use]
    pub fn from_parse_error(diagnostic: impl Into<String>) -> Self {
        Self {
            needs_update: false,
            suggestions: Vec::new(),
            parse_error: Some(diagnostic.into()),
        }
    }
}

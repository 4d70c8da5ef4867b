//! Status-comment rendering.
//!
//! The bot maintains exactly one comment per PR, identified by [`MARKER`];
//! everything user-visible about a delivery lands here.

use crate::analysis::AnalysisResult;
use crate::github::CommitOutcome;
use handlebars::{no_escape, Handlebars};
use serde_json::json;

/// Hidden marker identifying the bot's comment; the idempotency key for
/// comment reconciliation across duplicate deliveries.
pub const MARKER: &str = "<!-- readme-sync:status -->";

/// Everything the status comment can say about a delivery.
#[derive(Debug, Clone, Copy)]
pub struct StatusReport<'a> {
    /// The analysis result being reported.
    pub analysis: &'a AnalysisResult,

    /// Whether the head branch currently has a non-empty README.
    pub has_existing_readme: bool,

    /// Commit that was pushed, when one was.
    pub commit: Option<&'a CommitOutcome>,

    /// The merge produced no textual change, so nothing was committed.
    pub commit_noop: bool,

    /// Commit error text, when committing failed.
    pub commit_error: Option<&'a str>,

    /// The bot is running in comment-only mode.
    pub comment_only: bool,
}

const STATUS_TEMPLATE: &str = r"{{marker}}
## README sync

{{#if parse_error~}}
The analysis reply could not be validated, so no update decision was made:

```
{{parse_error}}
```
{{~else}}
{{#if needs_update~}}
This pull request looks like it affects the README.
{{#unless has_existing_readme}}
No README exists on this branch yet; applying the suggestions below creates one.
{{/unless}}

| Kind | Section | Priority | Why |
| --- | --- | --- | --- |
{{#each suggestions}}
| {{kind}} | `{{section}}` | {{priority}} | {{description}} |
{{/each}}
{{~else~}}
The README already covers this change. Nothing to do.
{{~/if}}
{{~/if}}
{{#if commit_sha}}

Committed as {{#if commit_url}}[`{{commit_sha}}`]({{commit_url}}){{else}}`{{commit_sha}}`{{/if}} ({{applied}} suggestion(s) applied).
{{/if}}
{{#if commit_noop}}

Merging the suggestions produced no textual change; nothing was committed.
{{/if}}
{{#if commit_error}}

Committing the update failed: `{{commit_error}}`

The suggestions above were **not** applied. Comment `{{apply_command}}` to retry, or apply them manually.
{{/if}}
{{#if comment_only}}

Running in comment-only mode. Comment `{{apply_command}}` to apply these suggestions.
{{/if}}
";

/// Renders the marker comment for a delivery.
pub struct ReportRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    /// Creates a renderer with markdown-safe settings.
    #[must_use]
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Markdown output; HTML escaping would mangle it.
        handlebars.register_escape_fn(no_escape);
        Self { handlebars }
    }

    /// Renders the status comment body, marker included.
    ///
    /// # Errors
    ///
    /// Returns a render error if the template fails to evaluate; callers
    /// treat this as a best-effort comment failure.
    pub fn render(&self, report: &StatusReport<'_>) -> Result<String, handlebars::RenderError> {
        let suggestions: Vec<_> = report
            .analysis
            .suggestions
            .iter()
            .map(|s| {
                json!({
                    "kind": s.kind.label(),
                    "section": if s.target_section.is_empty() { "-" } else { s.target_section.as_str() },
                    "priority": s.priority.as_str(),
                    "description": s.description,
                })
            })
            .collect();

        let data = json!({
            "marker": MARKER,
            "needs_update": report.analysis.needs_update,
            "parse_error": report.analysis.parse_error,
            "has_existing_readme": report.has_existing_readme,
            "suggestions": suggestions,
            "commit_sha": report.commit.map(|c| c.sha.clone()),
            "commit_url": report.commit.and_then(|c| c.url.as_ref().map(ToString::to_string)),
            "applied": report.commit.map(|c| c.suggestions_applied),
            "commit_noop": report.commit_noop,
            "commit_error": report.commit_error,
            "comment_only": report.comment_only,
            "apply_command": crate::webhook::APPLY_COMMAND,
        });

        self.handlebars.render_template(STATUS_TEMPLATE, &data)
    }
}

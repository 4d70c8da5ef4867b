//! Orchestrates one webhook delivery through the sync pipeline.
//!
//! States: Fetching → Analyzing → Reporting → Committing (optional) → Done.
//! Fetch and analysis failures abort the delivery; parse failures degrade
//! to "no update" with a recorded diagnostic; commit failures are reported
//! via comment and then propagated; comment failures are only ever logged.

mod error;
mod outcome;

pub use error::SyncError;
pub use outcome::SyncOutcome;

use crate::analysis::{AnalysisClient, AnalysisResult, Suggestion};
use crate::github::{CommitOutcome, PullRequestContext, ReadmeFile, RepoClient};
use crate::merge::{self, MergeOutcome};
use crate::report::{ReportRenderer, StatusReport, MARKER};
use crate::webhook::{SyncRequest, SyncTrigger};
use tracing::{info, info_span, warn, Instrument};

/// Overall budget for one delivery; expiry behaves like a fetch failure.
const DELIVERY_DEADLINE_SECS: u64 = 300;

/// Runs deliveries end to end.
pub struct Syncer {
    repo: RepoClient,
    analyzer: AnalysisClient,
    reporter: ReportRenderer,
    auto_commit: bool,
}

impl Syncer {
    /// Builds a syncer.
    ///
    /// With `auto_commit` off the pipeline stops after reporting; the
    /// apply command still commits, since it is an explicit user request.
    #[must_use]
    pub fn new(repo: RepoClient, analyzer: AnalysisClient, auto_commit: bool) -> Self {
        Self {
            repo,
            analyzer,
            reporter: ReportRenderer::new(),
            auto_commit,
        }
    }

    /// Runs one delivery to a terminal state under the delivery deadline.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] per the propagation policy: fetch and analysis
    /// failures abort, commit failures are reported then propagated, and
    /// deadline expiry surfaces as its own variant.
    pub async fn run(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        let span = info_span!(
            "sync",
            owner = %request.owner,
            repo = %request.repo,
            pr = request.number,
        );

        async {
            let result = tokio::time::timeout(
                tokio::time::Duration::from_secs(DELIVERY_DEADLINE_SECS),
                self.run_inner(request),
            )
            .await
            .map_err(|_| SyncError::DeadlineExceeded(DELIVERY_DEADLINE_SECS))?;

            match &result {
                Ok(outcome) => info!(outcome = outcome.as_str(), "Delivery complete"),
                Err(e) => warn!(error = %e, "Delivery failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        match request.trigger {
            SyncTrigger::PullRequestUpdate => self.run_full(request).await,
            SyncTrigger::ApplyCommand => self.run_apply(request).await,
        }
    }

    /// Full pipeline: fetch, analyze, report, then commit if warranted.
    async fn run_full(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        let (context, readme) = self.fetch(request).await?;
        let analysis = self.analyzer.analyze(&context, &readme.text).await?;

        if let Some(diagnostic) = &analysis.parse_error {
            warn!(%diagnostic, "Model reply failed validation; treating as no update");
        }

        self.post_status(&context, &readme, &analysis, None, false, None)
            .await;

        if !analysis.needs_update {
            return Ok(SyncOutcome::UpToDate {
                diagnostic: analysis.parse_error.clone(),
            });
        }

        if !self.auto_commit {
            return Ok(SyncOutcome::Reported {
                suggestions: analysis.suggestions.len(),
            });
        }

        self.commit(&context, &readme, &analysis, true).await
    }

    /// Apply path: re-analysis straight into committing, without a fresh
    /// status report. The PR may have advanced since the original comment,
    /// so a stale prior result is never reused.
    async fn run_apply(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        let (context, readme) = self.fetch(request).await?;
        let analysis = self.analyzer.analyze(&context, &readme.text).await?;

        if !analysis.needs_update {
            return Ok(SyncOutcome::UpToDate {
                diagnostic: analysis.parse_error.clone(),
            });
        }

        self.commit(&context, &readme, &analysis, false).await
    }

    /// Fetches the PR snapshot and README.
    ///
    /// When the delivery carried head coordinates the two fetches run
    /// concurrently; otherwise the README fetch waits for the snapshot to
    /// resolve the head. All fetches must succeed.
    async fn fetch(
        &self,
        request: &SyncRequest,
    ) -> Result<(PullRequestContext, ReadmeFile), SyncError> {
        match &request.head {
            Some(head) => futures::try_join!(
                self.repo
                    .fetch_pull_request(&request.owner, &request.repo, request.number),
                self.repo.fetch_readme(&head.owner, &head.repo, &head.branch),
            )
            .map_err(SyncError::Fetch),
            None => {
                let context = self
                    .repo
                    .fetch_pull_request(&request.owner, &request.repo, request.number)
                    .await
                    .map_err(SyncError::Fetch)?;
                let readme = self
                    .repo
                    .fetch_readme(&context.head_owner, &context.head_repo, &context.head_branch)
                    .await
                    .map_err(SyncError::Fetch)?;
                Ok((context, readme))
            }
        }
    }

    /// Merges and commits, reporting the result when `report` is set.
    async fn commit(
        &self,
        context: &PullRequestContext,
        readme: &ReadmeFile,
        analysis: &AnalysisResult,
        report: bool,
    ) -> Result<SyncOutcome, SyncError> {
        match merge::merge(&readme.text, &analysis.suggestions) {
            MergeOutcome::Unchanged => {
                info!("Merge produced no textual change; skipping commit");
                if report {
                    self.post_status(context, readme, analysis, None, true, None)
                        .await;
                }
                Ok(SyncOutcome::Unchanged {
                    suggestions: analysis.suggestions.len(),
                })
            }
            MergeOutcome::Updated { text, applied } => {
                let message = commit_message(context, &analysis.suggestions);
                let written = self
                    .repo
                    .write_readme(
                        &context.head_owner,
                        &context.head_repo,
                        &context.head_branch,
                        &text,
                        readme.sha.as_deref(),
                        &message,
                        applied,
                    )
                    .await;

                match written {
                    Ok(commit) => {
                        info!(sha = %commit.sha, applied, "README committed");
                        if report {
                            self.post_status(context, readme, analysis, Some(&commit), false, None)
                                .await;
                        }
                        Ok(SyncOutcome::Committed(commit))
                    }
                    Err(e) => {
                        // The suggestions must not be lost with the failed
                        // write; the comment is the fallback channel.
                        warn!(error = %e, "Commit failed; recording failure in comment");
                        self.post_status(
                            context,
                            readme,
                            analysis,
                            None,
                            false,
                            Some(&e.to_string()),
                        )
                        .await;
                        Err(SyncError::Commit(e))
                    }
                }
            }
        }
    }

    /// Upserts the marker comment; failures are logged, never escalated.
    async fn post_status(
        &self,
        context: &PullRequestContext,
        readme: &ReadmeFile,
        analysis: &AnalysisResult,
        commit: Option<&CommitOutcome>,
        commit_noop: bool,
        commit_error: Option<&str>,
    ) {
        let status = StatusReport {
            analysis,
            has_existing_readme: readme.is_present(),
            commit,
            commit_noop,
            commit_error,
            comment_only: !self.auto_commit,
        };

        let body = match self.reporter.render(&status) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to render status comment");
                return;
            }
        };

        if let Err(e) = self
            .repo
            .upsert_marker_comment(&context.owner, &context.repo, context.number, MARKER, &body)
            .await
        {
            warn!(error = %e, "Failed to post status comment");
        }
    }
}

/// Derives the commit message from suggestion metadata.
fn commit_message(context: &PullRequestContext, suggestions: &[Suggestion]) -> String {
    let mut message = format!("docs: sync README with #{}", context.number);
    if !suggestions.is_empty() {
        message.push('\n');
        for suggestion in suggestions {
            let target = if suggestion.target_section.is_empty() {
                "document end"
            } else {
                suggestion.target_section.as_str()
            };
            message.push_str(&format!(
                "\n- {}: {} ({})",
                suggestion.kind.label(),
                if suggestion.description.is_empty() {
                    "update"
                } else {
                    suggestion.description.as_str()
                },
                target,
            ));
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Priority, SuggestionKind};

    fn context() -> PullRequestContext {
        PullRequestContext {
            owner: "acme".to_string(),
            repo: "widget".to_string(),
            number: 12,
            title: "Add retries".to_string(),
            description: String::new(),
            base_branch: "main".to_string(),
            head_branch: "feature/x".to_string(),
            head_owner: "acme".to_string(),
            head_repo: "widget".to_string(),
            changed_files: Vec::new(),
            commit_count: 1,
            diff: String::new(),
        }
    }

    #[test]
    fn commit_message_lists_suggestion_metadata() {
        let suggestions = vec![
            Suggestion {
                kind: SuggestionKind::Setup,
                target_section: "Setup".to_string(),
                description: "Install step changed".to_string(),
                priority: Priority::High,
                body: "## Setup\n".to_string(),
            },
            Suggestion {
                kind: SuggestionKind::EnvironmentVariable,
                target_section: String::new(),
                description: String::new(),
                priority: Priority::Low,
                body: "x".to_string(),
            },
        ];
        let message = commit_message(&context(), &suggestions);
        assert!(message.starts_with("docs: sync README with #12"));
        assert!(message.contains("- setup: Install step changed (Setup)"));
        assert!(message.contains("- environment variable: update (document end)"));
    }

    #[test]
    fn commit_message_without_suggestions_is_single_line() {
        let message = commit_message(&context(), &[]);
        assert_eq!(message, "docs: sync README with #12");
    }
}

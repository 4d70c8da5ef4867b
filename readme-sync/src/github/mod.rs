//! Repository client over the GitHub API.
//!
//! Wraps an authenticated [`Octocrab`] with the narrow surface the sync
//! pipeline consumes: PR snapshot fetching, README read/write with
//! SHA-gated commits, and marker-comment reconciliation.

mod cache;
mod context;
mod error;
mod rate_limit;

pub use cache::ClientCache;
pub use context::{CommitOutcome, PullRequestContext, ReadmeFile};
pub use error::RepoError;

use octocrab::models::issues::Comment;
use octocrab::models::CommentId;
use octocrab::Octocrab;
use tracing::debug;

/// Path of the document this bot maintains.
pub const README_PATH: &str = "README.md";

/// Client for one repository host, authenticated per installation.
#[derive(Clone)]
pub struct RepoClient {
    octocrab: Octocrab,
}

impl RepoClient {
    /// Creates a client over an authenticated GitHub handle.
    #[must_use]
    pub fn new(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }

    /// Fetches the read-only PR snapshot: metadata, changed files, commits
    /// and the unified diff, requested concurrently and joined.
    ///
    /// Head repository owner/name resolve to the fork for fork-originated
    /// PRs and fall back to the base repository when GitHub reports no head
    /// repo (e.g. a deleted fork).
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] if any of the four fetches fails; there is no
    /// partial snapshot.
    pub async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestContext, RepoError> {
        debug!(owner, repo, number, "Fetching pull request snapshot");

        let pulls = self.octocrab.pulls(owner, repo);
        let (pr, files, commits, diff) = futures::try_join!(
            pulls.get(number),
            pulls.list_files(number),
            pulls.pr_commits(number).send(),
            pulls.get_diff(number),
        )?;

        let (head_owner, head_repo) = match pr.head.repo.as_ref() {
            Some(head_repository) => (
                head_repository
                    .owner
                    .as_ref()
                    .map_or_else(|| owner.to_string(), |o| o.login.clone()),
                head_repository.name.clone(),
            ),
            None => (owner.to_string(), repo.to_string()),
        };

        Ok(PullRequestContext {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
            title: pr.title.clone().unwrap_or_default(),
            description: pr.body.clone().unwrap_or_default(),
            base_branch: pr.base.ref_field.clone(),
            head_branch: pr.head.ref_field.clone(),
            head_owner,
            head_repo,
            changed_files: files.items.into_iter().map(|f| f.filename).collect(),
            commit_count: commits.items.len(),
            diff,
        })
    }

    /// Fetches `README.md` at a ref.
    ///
    /// A missing file is a valid empty state, not an error; anything else
    /// propagates.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] for failures other than not-found.
    pub async fn fetch_readme(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<ReadmeFile, RepoError> {
        let response = self
            .octocrab
            .repos(owner, repo)
            .get_content()
            .path(README_PATH)
            .r#ref(git_ref)
            .send()
            .await;

        match response {
            Ok(contents) => {
                let Some(item) = contents.items.into_iter().next() else {
                    return Ok(ReadmeFile::default());
                };
                let text = item.decoded_content().unwrap_or_default();
                Ok(ReadmeFile {
                    text,
                    sha: Some(item.sha),
                })
            }
            Err(e) if is_not_found(&e) => Ok(ReadmeFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the README with a SHA-conditional commit.
    ///
    /// With `prior_sha` set, the platform rejects the write when the file
    /// moved under us (lost-update protection); that rejection surfaces as
    /// a retryable error. Without it the file is created.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] on API failure, including SHA conflicts.
    pub async fn write_readme(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        content: &str,
        prior_sha: Option<&str>,
        message: &str,
        suggestions_applied: usize,
    ) -> Result<CommitOutcome, RepoError> {
        rate_limit::ensure_write_budget(&self.octocrab).await?;

        let repos = self.octocrab.repos(owner, repo);
        let update = match prior_sha {
            Some(sha) => {
                repos
                    .update_file(README_PATH, message, content, sha)
                    .branch(branch)
                    .send()
                    .await?
            }
            None => {
                repos
                    .create_file(README_PATH, message, content)
                    .branch(branch)
                    .send()
                    .await?
            }
        };

        let sha = update
            .commit
            .sha
            .ok_or_else(|| RepoError::MalformedResponse {
                message: "commit SHA missing from file write response".to_string(),
            })?;

        Ok(CommitOutcome {
            sha,
            url: update
                .commit
                .html_url
                .and_then(|u| url::Url::parse(&u).ok()),
            suggestions_applied,
        })
    }

    /// Finds the bot's prior status comment on a PR by its marker.
    ///
    /// The marker is the sole idempotency key for comment reconciliation;
    /// nothing else about the comment identifies it.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] if listing comments fails.
    pub async fn find_marker_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        marker: &str,
    ) -> Result<Option<Comment>, RepoError> {
        let page = self
            .octocrab
            .issues(owner, repo)
            .list_comments(number)
            .per_page(100)
            .send()
            .await?;

        Ok(page
            .items
            .into_iter()
            .find(|comment| body_has_marker(comment.body.as_deref(), marker)))
    }

    /// Creates a new PR comment.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] if the API call fails.
    pub async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), RepoError> {
        rate_limit::ensure_write_budget(&self.octocrab).await?;
        self.octocrab
            .issues(owner, repo)
            .create_comment(number, body)
            .await?;
        Ok(())
    }

    /// Updates an existing comment in place.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] if the API call fails.
    pub async fn update_comment(
        &self,
        owner: &str,
        repo: &str,
        comment_id: CommentId,
        body: &str,
    ) -> Result<(), RepoError> {
        rate_limit::ensure_write_budget(&self.octocrab).await?;
        self.octocrab
            .issues(owner, repo)
            .update_comment(comment_id, body)
            .await?;
        Ok(())
    }

    /// Creates or updates the marker comment, keyed solely by `marker`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] if listing or writing fails.
    pub async fn upsert_marker_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        marker: &str,
        body: &str,
    ) -> Result<(), RepoError> {
        match self.find_marker_comment(owner, repo, number, marker).await? {
            Some(existing) => {
                debug!(comment_id = %existing.id, "Updating existing marker comment");
                self.update_comment(owner, repo, existing.id, body).await
            }
            None => self.create_comment(owner, repo, number, body).await,
        }
    }
}

/// Whether a comment body carries the bot marker.
fn body_has_marker(body: Option<&str>, marker: &str) -> bool {
    body.is_some_and(|b| b.contains(marker))
}

/// Whether an error is a not-found condition.
fn is_not_found(error: &octocrab::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("404") || msg.contains("not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_detection_matches_anywhere_in_body() {
        let marker = "<!-- readme-sync:status -->";
        assert!(body_has_marker(
            Some("<!-- readme-sync:status -->\n## README sync"),
            marker
        ));
        assert!(!body_has_marker(Some("unrelated comment"), marker));
        assert!(!body_has_marker(None, marker));
    }
}

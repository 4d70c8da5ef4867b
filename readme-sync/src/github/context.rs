//! Pull request snapshot types.

use url::Url;

/// Read-only snapshot of a pull request, fetched once per delivery.
#[derive(Debug, Clone)]
pub struct PullRequestContext {
    /// Base repository owner.
    pub owner: String,

    /// Base repository name.
    pub repo: String,

    /// Pull request number.
    pub number: u64,

    /// PR title.
    pub title: String,

    /// PR description, empty if absent.
    pub description: String,

    /// Base branch name.
    pub base_branch: String,

    /// Head branch name.
    pub head_branch: String,

    /// Head repository owner. Differs from `owner` for fork PRs.
    pub head_owner: String,

    /// Head repository name. Differs from `repo` for fork PRs.
    pub head_repo: String,

    /// Paths of files changed by the PR.
    pub changed_files: Vec<String>,

    /// Number of commits on the PR.
    pub commit_count: usize,

    /// Unified diff of the PR.
    pub diff: String,
}

impl PullRequestContext {
    /// Returns the base repository identifier in "owner/name" form.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// README contents at a ref.
///
/// A missing file and an empty file are indistinguishable by design; both
/// report `is_present() == false`, which only affects comment formatting.
#[derive(Debug, Clone, Default)]
pub struct ReadmeFile {
    /// File contents, empty when the file does not exist.
    pub text: String,

    /// Blob SHA used to gate conditional writes; `None` when the file does
    /// not exist yet.
    pub sha: Option<String>,
}

impl ReadmeFile {
    /// Whether the README has any content.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Result of a successful README write.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// SHA of the created commit.
    pub sha: String,

    /// Web URL of the commit, when the API reported one.
    pub url: Option<Url>,

    /// How many suggestions the merge applied.
    pub suggestions_applied: usize,
}

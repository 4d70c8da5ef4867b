//! Inbound delivery record and webhook payload shapes.

use serde::Deserialize;

/// Header carrying the event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the unique delivery id.
pub const DELIVERY_ID_HEADER: &str = "x-github-delivery";

/// Header carrying the HMAC payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// One inbound webhook delivery, as assembled by the HTTP layer.
///
/// The dispatcher only ever inspects this record; it performs no network
/// calls of its own.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// HTTP method of the request.
    pub method: String,

    /// Event type from the event header, if present.
    pub event: Option<String>,

    /// Unique delivery id, used for log correlation only.
    pub delivery_id: Option<String>,

    /// Payload signature header, if present.
    pub signature: Option<String>,

    /// Raw request body.
    pub body: Vec<u8>,
}

/// What a delivery asks the orchestrator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// A pull request was opened or its head moved: full pipeline.
    PullRequestUpdate,

    /// A user issued the apply command: re-analyze and commit, without a
    /// fresh status report.
    ApplyCommand,
}

/// Head branch coordinates carried by a PR event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadRef {
    /// Head repository owner (the fork owner for fork PRs).
    pub owner: String,

    /// Head repository name.
    pub repo: String,

    /// Head branch name.
    pub branch: String,
}

/// Validated work order forwarded to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Base repository owner.
    pub owner: String,

    /// Base repository name.
    pub repo: String,

    /// Pull request number.
    pub number: u64,

    /// Head coordinates when the payload carried them; `None` for
    /// comment-triggered runs, which resolve the head from the PR.
    pub head: Option<HeadRef>,

    /// GitHub App installation the delivery belongs to.
    pub installation_id: Option<u64>,

    /// Which path through the pipeline to take.
    pub trigger: SyncTrigger,
}

/// Pull-request event actions this bot distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PullRequestAction {
    Opened,
    Synchronize,
    Reopened,
    #[serde(other)]
    Other,
}

/// Issue-comment event actions this bot distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum CommentAction {
    Created,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestPayload {
    pub action: PullRequestAction,
    pub pull_request: PullRequestInfo,
    pub repository: RepositoryInfo,
    #[serde(default)]
    pub installation: Option<InstallationInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestInfo {
    pub number: u64,
    pub head: BranchInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchInfo {
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// `None` when the head repository was deleted out from under the PR.
    #[serde(default)]
    pub repo: Option<RepositoryInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryInfo {
    pub name: String,
    pub owner: OwnerInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerInfo {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstallationInfo {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueCommentPayload {
    pub action: CommentAction,
    pub issue: IssueInfo,
    pub comment: CommentInfo,
    pub repository: RepositoryInfo,
    #[serde(default)]
    pub installation: Option<InstallationInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueInfo {
    pub number: u64,
    /// Present only when the parent issue is a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentInfo {
    #[serde(default)]
    pub body: String,
}

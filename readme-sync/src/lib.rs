#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod analysis;
pub mod github;
pub mod merge;
pub mod report;
pub mod sync;
pub mod webhook;

pub use analysis::{
    AnalysisClient, AnalysisError, AnalysisResult, ModelConfig, Priority, Suggestion,
    SuggestionKind,
};
pub use github::{
    ClientCache, CommitOutcome, PullRequestContext, ReadmeFile, RepoClient, RepoError,
};
pub use merge::{merge, MergeOutcome};
pub use report::{ReportRenderer, StatusReport, MARKER};
pub use sync::{SyncError, SyncOutcome, Syncer};
pub use webhook::{
    dispatch, Delivery, Dispatch, HeadRef, IgnoreReason, Rejection, SignatureError,
    SignatureVerifier, SyncRequest, SyncTrigger, APPLY_COMMAND,
};

//! Orchestrator error types.

use crate::analysis::AnalysisError;
use crate::github::RepoError;
use thiserror::Error;

/// Errors that terminate a delivery.
///
/// Parse failures never appear here: they degrade to a "no update" result
/// with a recorded diagnostic. Comment failures never appear here either;
/// they are logged and swallowed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching the PR snapshot or README failed; the delivery is aborted
    /// with no partial processing.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] RepoError),

    /// The model-service call failed (distinct from a parse failure).
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// The README write was rejected (SHA conflict or other write error).
    /// Reported via comment first when possible, then propagated so the
    /// delivery outcome reflects the true failure.
    #[error("Commit failed: {0}")]
    Commit(#[source] RepoError),

    /// The per-delivery deadline expired; equivalent to a fetch/analysis
    /// failure for callers.
    #[error("Delivery deadline of {0} seconds exceeded")]
    DeadlineExceeded(u64),
}

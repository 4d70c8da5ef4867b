//! Repository client error types.

use thiserror::Error;

/// Errors that can occur while talking to the hosting platform.
#[derive(Debug, Error)]
pub enum RepoError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// The API answered but the response is missing required data.
    #[error("Malformed GitHub response: {message}")]
    MalformedResponse { message: String },
}

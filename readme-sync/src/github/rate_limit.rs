//! Write-budget checks against the GitHub rate-limit API.

use octocrab::Octocrab;
use std::time::Duration;
use tracing::{info, warn};

/// Remaining core requests below which writes wait for the reset.
const MIN_REMAINING: u32 = 5;

/// Longest a single delivery will wait on a rate-limit reset. The delivery
/// deadline dominates anyway; anything longer should fail the delivery and
/// be retried by the platform.
const MAX_WAIT_SECS: u64 = 120;

/// Ensures enough core-API budget remains before a mutating call, sleeping
/// until the reported reset when the budget is critically low.
///
/// # Errors
///
/// Returns an error if the rate-limit API call itself fails.
pub(crate) async fn ensure_write_budget(octocrab: &Octocrab) -> Result<(), octocrab::Error> {
    let rate_limit = octocrab.ratelimit().get().await?;
    let core = &rate_limit.resources.core;
    let remaining = core.remaining as u32;

    if remaining >= MIN_REMAINING {
        return Ok(());
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    if core.reset <= now {
        return Ok(());
    }

    let wait_secs = core.reset - now;
    if wait_secs > MAX_WAIT_SECS {
        warn!(
            wait_secs,
            max_wait = MAX_WAIT_SECS,
            "Rate limit reset too far in the future, capping wait"
        );
    }
    let actual_wait = wait_secs.min(MAX_WAIT_SECS);
    info!(remaining, wait_secs = actual_wait, "Core rate limit low, waiting");
    tokio::time::sleep(Duration::from_secs(actual_wait)).await;
    Ok(())
}

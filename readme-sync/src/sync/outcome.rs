//! Terminal outcomes of a delivery.

use crate::github::CommitOutcome;

/// How a delivery ended, for logging and CLI exit codes.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// The README already covers the change. Carries the parse diagnostic
    /// when the "no update" verdict came from a degraded analysis rather
    /// than a real one.
    UpToDate {
        /// Parse diagnostic, when the model reply failed validation.
        diagnostic: Option<String>,
    },

    /// Suggestions were reported but committing is disabled.
    Reported {
        /// Number of suggestions in the report.
        suggestions: usize,
    },

    /// The merge produced no textual change; nothing was committed.
    Unchanged {
        /// Number of suggestions that were merged.
        suggestions: usize,
    },

    /// The README was updated and committed.
    Committed(CommitOutcome),
}

impl SyncOutcome {
    /// Whether updates were called for but not persisted by this run.
    ///
    /// Drives the CLI's non-zero exit in comment-only mode.
    #[must_use]
    pub fn updates_pending(&self) -> bool {
        matches!(self, Self::Reported { .. })
    }

    /// Short status label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpToDate { .. } => "up-to-date",
            Self::Reported { .. } => "reported",
            Self::Unchanged { .. } => "unchanged",
            Self::Committed(_) => "committed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_reported_leaves_updates_pending() {
        assert!(SyncOutcome::Reported { suggestions: 2 }.updates_pending());
        assert!(!SyncOutcome::UpToDate { diagnostic: None }.updates_pending());
        assert!(!SyncOutcome::Unchanged { suggestions: 1 }.updates_pending());
    }
}

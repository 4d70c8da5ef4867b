//! Deterministic README section merging.
//!
//! [`merge`] is a pure text transformation: no I/O, deterministic, and
//! idempotent for replace-type suggestions (replacing a section twice with
//! the same body yields the same document as replacing it once).

use crate::analysis::Suggestion;
use regex::Regex;

/// Result of merging suggestions into a document.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The merged text is byte-identical to the input; nothing to commit.
    Unchanged,

    /// The document changed.
    Updated {
        /// The new document text.
        text: String,
        /// Number of suggestions that were applied.
        applied: usize,
    },
}

impl MergeOutcome {
    /// Whether the merge produced no textual difference.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Applies `suggestions` to `readme` in order, left to right.
///
/// Later suggestions see the document state left by earlier ones. Heading
/// positions are recomputed for every suggestion; indices are never carried
/// across splices.
#[must_use]
pub fn merge(readme: &str, suggestions: &[Suggestion]) -> MergeOutcome {
    let mut text = readme.to_string();
    let mut applied = 0usize;

    for suggestion in suggestions {
        if suggestion.body.is_empty() {
            continue;
        }
        text = apply_suggestion(&text, suggestion);
        applied += 1;
    }

    if text == readme {
        MergeOutcome::Unchanged
    } else {
        MergeOutcome::Updated { text, applied }
    }
}

/// Applies a single suggestion to the document.
fn apply_suggestion(doc: &str, suggestion: &Suggestion) -> String {
    let target = suggestion.target_section.trim();

    if target.is_empty() || target.to_lowercase().contains("new section") {
        return append_section(doc, &suggestion.body);
    }

    if let Some(name) = after_directive(target) {
        return insert_after_section(doc, name, &suggestion.body);
    }

    replace_section(doc, target, &suggestion.body)
}

/// Extracts `<X>` from an `after <X>` directive, case-insensitively.
fn after_directive(target: &str) -> Option<&str> {
    let prefix = target.get(..6)?;
    if prefix.eq_ignore_ascii_case("after ") {
        Some(target[6..].trim())
    } else {
        None
    }
}

/// Appends `body` at document end, separated by a blank line.
fn append_section(doc: &str, body: &str) -> String {
    if doc.is_empty() {
        body.to_string()
    } else {
        format!("{doc}\n\n{body}")
    }
}

/// Replaces the section under the heading matching `name` with `body`.
///
/// The replaced span runs from the heading line (inclusive) through the
/// line before the next heading, so `body` must carry any heading text the
/// suggestion wants retained. Falls back to appending when no heading
/// matches.
fn replace_section(doc: &str, name: &str, body: &str) -> String {
    let lines: Vec<&str> = doc.split('\n').collect();
    let Some(start) = find_heading(&lines, name) else {
        return append_section(doc, body);
    };
    let end = section_end(&lines, start);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend(&lines[..start]);
    out.extend(body.split('\n'));
    out.extend(&lines[end..]);
    out.join("\n")
}

/// Splices `body` immediately after the section of the heading matching
/// `name`, padded by blank lines. Falls back to appending when no heading
/// matches.
fn insert_after_section(doc: &str, name: &str, body: &str) -> String {
    let lines: Vec<&str> = doc.split('\n').collect();
    let Some(start) = find_heading(&lines, name) else {
        return append_section(doc, body);
    };
    let end = section_end(&lines, start);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 4);
    out.extend(&lines[..end]);
    out.push("");
    out.extend(body.split('\n'));
    out.push("");
    out.extend(&lines[end..]);
    out.join("\n")
}

/// Finds the first heading whose text starts with `name`, case-insensitive.
///
/// The name is matched as a regex-escaped literal anchored at the start of
/// the heading text; ties go to the first occurrence in document order.
fn find_heading(lines: &[&str], name: &str) -> Option<usize> {
    let pattern = Regex::new(&format!("(?i)^{}", regex::escape(name))).ok()?;
    lines
        .iter()
        .position(|line| heading_text(line).is_some_and(|text| pattern.is_match(text)))
}

/// Returns the index one past the last line of the section starting at
/// `start`: the next heading line, or end of document.
fn section_end(lines: &[&str], start: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| heading_text(line).is_some())
        .map_or(lines.len(), |(idx, _)| idx)
}

/// Extracts the text of a markdown heading line (1-6 `#` then whitespace).
fn heading_text(line: &str) -> Option<&str> {
    let hashes = line.len() - line.trim_start_matches('#').len();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    Some(rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Priority, SuggestionKind};

    fn suggestion(target: &str, body: &str) -> Suggestion {
        Suggestion {
            kind: SuggestionKind::Other,
            target_section: target.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            body: body.to_string(),
        }
    }

    #[test]
    fn empty_suggestion_list_is_identity() {
        let doc = "# Title\n\ntext\n";
        assert_eq!(merge(doc, &[]), MergeOutcome::Unchanged);
    }

    #[test]
    fn empty_body_is_a_noop() {
        let doc = "# Title\n";
        assert_eq!(merge(doc, &[suggestion("Title", "")]), MergeOutcome::Unchanged);
    }

    #[test]
    fn new_section_appends_with_blank_line() {
        let doc = "# Title\ntext";
        let body = "## New\nstuff";
        match merge(doc, &[suggestion("new section", body)]) {
            MergeOutcome::Updated { text, applied } => {
                assert_eq!(text, "# Title\ntext\n\n## New\nstuff");
                assert!(text.ends_with(body));
                assert_eq!(text.len(), doc.len() + body.len() + 2);
                assert_eq!(applied, 1);
            }
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn new_section_on_empty_document_is_body_alone() {
        match merge("", &[suggestion("new section", "## Setup\nrun it")]) {
            MergeOutcome::Updated { text, .. } => assert_eq!(text, "## Setup\nrun it"),
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn replaces_existing_section_leaving_others_untouched() {
        // Scenario: replace the Setup block, Title section stays intact.
        let doc = "# Title\n\n## Setup\nrun npm install\n";
        let merged = merge(doc, &[suggestion("Setup", "## Setup\nrun npm ci\n")]);
        match merged {
            MergeOutcome::Updated { text, .. } => {
                assert_eq!(text, "# Title\n\n## Setup\nrun npm ci\n");
            }
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn replace_is_idempotent() {
        let doc = "# Title\n\n## Setup\nold\n";
        let s = suggestion("Setup", "## Setup\nnew\n");
        let once = match merge(doc, std::slice::from_ref(&s)) {
            MergeOutcome::Updated { text, .. } => text,
            MergeOutcome::Unchanged => panic!("expected update"),
        };
        assert_eq!(merge(&once, &[s]), MergeOutcome::Unchanged);
    }

    #[test]
    fn replace_stops_at_next_heading() {
        let doc = "# A\n\n## Setup\nold line\n\n## Other\nkeep\n";
        let merged = merge(doc, &[suggestion("Setup", "## Setup\nnew\n")]);
        match merged {
            MergeOutcome::Updated { text, .. } => {
                assert!(text.contains("## Setup\nnew"));
                assert!(text.contains("## Other\nkeep"));
                assert!(!text.contains("old line"));
            }
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn missing_heading_falls_back_to_append() {
        let doc = "# Title\ntext";
        let body = "## Missing\nnew";
        let via_name = merge(doc, &[suggestion("Missing", body)]);
        let via_directive = merge(doc, &[suggestion("new section", body)]);
        assert_eq!(via_name, via_directive);
    }

    #[test]
    fn heading_match_is_case_insensitive() {
        let doc = "# Title\n\n## SETUP\nold\n";
        let merged = merge(doc, &[suggestion("setup", "## Setup\nnew\n")]);
        match merged {
            MergeOutcome::Updated { text, .. } => assert!(!text.contains("old")),
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn regex_metacharacters_in_section_name_are_literal() {
        let doc = "# C++ (advanced)\nold\n";
        let merged = merge(doc, &[suggestion("C++ (advanced)", "# C++ (advanced)\nnew\n")]);
        match merged {
            MergeOutcome::Updated { text, .. } => assert!(!text.contains("old")),
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn ambiguous_heading_takes_first_occurrence() {
        let doc = "## Setup\nfirst\n\n## Setup\nsecond\n";
        let merged = merge(doc, &[suggestion("Setup", "## Setup\nreplaced\n")]);
        match merged {
            MergeOutcome::Updated { text, .. } => {
                assert!(text.starts_with("## Setup\nreplaced"));
                assert!(text.contains("second"));
                assert!(!text.contains("first"));
            }
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn after_directive_splices_before_next_heading() {
        let doc = "# A\nintro\n## B\nrest\n";
        let merged = merge(doc, &[suggestion("after A", "## Inserted\nbody")]);
        match merged {
            MergeOutcome::Updated { text, .. } => {
                assert_eq!(text, "# A\nintro\n\n## Inserted\nbody\n\n## B\nrest\n");
            }
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn after_directive_with_unknown_heading_appends() {
        let doc = "# A\ntext";
        let merged = merge(doc, &[suggestion("after Nowhere", "body")]);
        match merged {
            MergeOutcome::Updated { text, .. } => assert_eq!(text, "# A\ntext\n\nbody"),
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn later_suggestion_sees_earlier_result() {
        // Two suggestions target the same heading; the second wins.
        let doc = "## Setup\noriginal\n";
        let merged = merge(
            doc,
            &[
                suggestion("Setup", "## Setup\nfirst\n"),
                suggestion("Setup", "## Setup\nsecond\n"),
            ],
        );
        match merged {
            MergeOutcome::Updated { text, applied } => {
                assert_eq!(text, "## Setup\nsecond\n");
                assert_eq!(applied, 2);
            }
            MergeOutcome::Unchanged => panic!("expected update"),
        }
    }

    #[test]
    fn heading_requires_space_after_hashes() {
        assert_eq!(heading_text("## Setup"), Some("Setup"));
        assert_eq!(heading_text("##Setup"), None);
        assert_eq!(heading_text("#!/bin/sh"), None);
        assert_eq!(heading_text("####### Seven"), None);
        assert_eq!(heading_text("text"), None);
    }
}

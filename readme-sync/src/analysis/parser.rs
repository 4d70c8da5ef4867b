//! Extracts and validates the structured analysis from raw model output.

use serde::Deserialize;

use super::result::{AnalysisResult, Suggestion};

/// The JSON contract the model is instructed to return.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePayload {
    needs_update: bool,
    suggestions: Vec<Suggestion>,
}

/// Parses raw model output into an [`AnalysisResult`].
///
/// The model may wrap its JSON in prose or code fences, so the first
/// balanced `{...}` span is located and decoded. Validation failures never
/// raise; they come back as a result with `parse_error` set, `needs_update`
/// forced to `false` and no suggestions, so a malformed reply cannot crash
/// the pipeline or silently pass for "no changes needed".
#[must_use]
pub fn parse(raw: &str) -> AnalysisResult {
    let Some(span) = extract_json_object(raw) else {
        return AnalysisResult::from_parse_error("no JSON object found in model output");
    };

    match serde_json::from_str::<ResponsePayload>(span) {
        Ok(payload) => AnalysisResult {
            needs_update: payload.needs_update,
            suggestions: payload.suggestions,
            parse_error: None,
        },
        Err(e) => AnalysisResult::from_parse_error(format!("invalid analysis payload: {e}")),
    }
}

/// Returns the first balanced `{...}` span in `raw`, if any.
///
/// Braces inside JSON string literals are skipped, including escaped quotes.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::{Priority, SuggestionKind};

    #[test]
    fn parses_bare_json() {
        let result = parse(r#"{"needsUpdate": true, "suggestions": []}"#);
        assert!(result.needs_update);
        assert!(result.suggestions.is_empty());
        assert!(result.parse_error.is_none());
    }

    #[test]
    fn parses_json_wrapped_in_prose_and_fences() {
        let raw = "Here is my analysis:\n```json\n{\"needsUpdate\": true, \"suggestions\": [\
                   {\"kind\": \"setup\", \"targetSection\": \"Setup\", \"description\": \"d\", \
                   \"priority\": \"high\", \"body\": \"## Setup\\nnew\"}]}\n```\nDone.";
        let result = parse(raw);
        assert!(result.needs_update);
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].kind, SuggestionKind::Setup);
        assert_eq!(result.suggestions[0].priority, Priority::High);
    }

    #[test]
    fn skips_braces_inside_string_literals() {
        let raw = r#"{"needsUpdate": false, "suggestions": [{"kind": "other", "body": "use {braces} here", "targetSection": "x", "description": "", "priority": "low"}]}"#;
        let result = parse(raw);
        assert!(result.parse_error.is_none());
        assert_eq!(result.suggestions[0].body, "use {braces} here");
    }

    #[test]
    fn prose_without_json_reports_parse_error() {
        let result = parse("I believe the README does not need an update.");
        assert!(!result.needs_update);
        assert!(result.suggestions.is_empty());
        let diagnostic = result.parse_error.expect("diagnostic must be set");
        assert!(!diagnostic.is_empty());
    }

    #[test]
    fn wrong_needs_update_type_reports_parse_error() {
        let result = parse(r#"{"needsUpdate": "yes", "suggestions": []}"#);
        assert!(!result.needs_update);
        assert!(result.parse_error.is_some());
    }

    #[test]
    fn missing_suggestions_reports_parse_error() {
        let result = parse(r#"{"needsUpdate": true}"#);
        assert!(!result.needs_update);
        assert!(result.parse_error.is_some());
    }

    #[test]
    fn unbalanced_json_reports_parse_error() {
        let result = parse(r#"{"needsUpdate": true, "suggestions": ["#);
        assert!(result.parse_error.is_some());
    }

    #[test]
    fn never_panics_on_arbitrary_input() {
        for raw in ["", "{", "}", "{}", "\\\"{", "{\"a\": \"\\\"}\"}", "\u{1F600}{}"] {
            let _ = parse(raw);
        }
    }
}

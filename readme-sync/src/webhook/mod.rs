//! Webhook dispatch: the boundary between HTTP and the sync pipeline.
//!
//! [`dispatch`] routes each delivery over an explicit {event, action}
//! matrix to exactly one named outcome. Ignoring a delivery is a success,
//! never an error, and the dispatcher itself performs no network calls.

mod delivery;
mod signature;

pub use delivery::{
    Delivery, HeadRef, SyncRequest, SyncTrigger, DELIVERY_ID_HEADER, EVENT_HEADER,
    SIGNATURE_HEADER,
};
pub use signature::{SignatureError, SignatureVerifier};

use delivery::{
    CommentAction, IssueCommentPayload, PullRequestAction, PullRequestPayload,
};
use tracing::debug;

/// Comment body that triggers a user-requested apply run.
pub const APPLY_COMMAND: &str = "@readme-sync apply";

/// Why a delivery was deliberately ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Event type this bot does not handle.
    UnsupportedEvent { event: String },

    /// Pull-request action outside {opened, synchronize, reopened}.
    UnsupportedPullRequestAction,

    /// Issue-comment action other than created.
    UnsupportedCommentAction,

    /// Comment whose parent issue is not a pull request.
    NotAPullRequest,

    /// Comment body is not the apply command.
    NotTheApplyCommand,
}

/// Why a delivery was rejected before routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// HTTP method other than POST; checked before any payload inspection.
    MethodNotAllowed { method: String },

    /// Signature missing, malformed, or mismatched.
    InvalidSignature { detail: String },

    /// No event-type header on the request.
    MissingEventHeader,

    /// Payload did not match the expected webhook schema.
    MalformedPayload { detail: String },
}

impl Rejection {
    /// HTTP status this rejection maps to.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MethodNotAllowed { .. } => 405,
            Self::InvalidSignature { .. } => 401,
            Self::MissingEventHeader | Self::MalformedPayload { .. } => 400,
        }
    }
}

/// Routing decision for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Forward this request to the orchestrator.
    Run(SyncRequest),

    /// Deliberately ignored; a 200 outcome.
    Ignored(IgnoreReason),

    /// Rejected before routing; a 4xx outcome.
    Rejected(Rejection),
}

impl Dispatch {
    /// HTTP status of the routing decision itself.
    ///
    /// For [`Dispatch::Run`] this is the optimistic 200; the final status
    /// depends on the orchestrator's result.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Run(_) | Self::Ignored(_) => 200,
            Self::Rejected(rejection) => rejection.http_status(),
        }
    }
}

/// Routes one delivery to exactly one outcome.
///
/// Check order: method, signature, event header, payload shape, then the
/// {event, action} matrix.
#[must_use]
pub fn dispatch(delivery: &Delivery, verifier: &SignatureVerifier) -> Dispatch {
    if !delivery.method.eq_ignore_ascii_case("POST") {
        return Dispatch::Rejected(Rejection::MethodNotAllowed {
            method: delivery.method.clone(),
        });
    }

    if let Err(e) = verifier.verify(&delivery.body, delivery.signature.as_deref()) {
        return Dispatch::Rejected(Rejection::InvalidSignature {
            detail: e.to_string(),
        });
    }

    let Some(event) = delivery.event.as_deref() else {
        return Dispatch::Rejected(Rejection::MissingEventHeader);
    };

    debug!(event, delivery_id = ?delivery.delivery_id, "Routing delivery");

    match event {
        "pull_request" => dispatch_pull_request(&delivery.body),
        "issue_comment" => dispatch_issue_comment(&delivery.body),
        other => Dispatch::Ignored(IgnoreReason::UnsupportedEvent {
            event: other.to_string(),
        }),
    }
}

fn dispatch_pull_request(body: &[u8]) -> Dispatch {
    let payload: PullRequestPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            return Dispatch::Rejected(Rejection::MalformedPayload {
                detail: e.to_string(),
            })
        }
    };

    match payload.action {
        PullRequestAction::Opened
        | PullRequestAction::Synchronize
        | PullRequestAction::Reopened => {}
        PullRequestAction::Other => {
            return Dispatch::Ignored(IgnoreReason::UnsupportedPullRequestAction)
        }
    }

    let head = payload.pull_request.head.repo.as_ref().map(|repo| HeadRef {
        owner: repo.owner.login.clone(),
        repo: repo.name.clone(),
        branch: payload.pull_request.head.ref_name.clone(),
    });

    Dispatch::Run(SyncRequest {
        owner: payload.repository.owner.login,
        repo: payload.repository.name,
        number: payload.pull_request.number,
        head,
        installation_id: payload.installation.map(|i| i.id),
        trigger: SyncTrigger::PullRequestUpdate,
    })
}

fn dispatch_issue_comment(body: &[u8]) -> Dispatch {
    let payload: IssueCommentPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            return Dispatch::Rejected(Rejection::MalformedPayload {
                detail: e.to_string(),
            })
        }
    };

    if payload.action != CommentAction::Created {
        return Dispatch::Ignored(IgnoreReason::UnsupportedCommentAction);
    }
    if payload.issue.pull_request.is_none() {
        return Dispatch::Ignored(IgnoreReason::NotAPullRequest);
    }
    // Exact match after trimming surrounding whitespace; internal
    // whitespace is not normalized.
    if payload.comment.body.trim() != APPLY_COMMAND {
        return Dispatch::Ignored(IgnoreReason::NotTheApplyCommand);
    }

    Dispatch::Run(SyncRequest {
        owner: payload.repository.owner.login,
        repo: payload.repository.name,
        number: payload.issue.number,
        head: None,
        installation_id: payload.installation.map(|i| i.id),
        trigger: SyncTrigger::ApplyCommand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new("s3cret").unwrap()
    }

    fn delivery(event: Option<&str>, payload: &serde_json::Value) -> Delivery {
        let body = serde_json::to_vec(payload).unwrap();
        let signature = verifier().signature_for(&body);
        Delivery {
            method: "POST".to_string(),
            event: event.map(str::to_string),
            delivery_id: Some("d-1".to_string()),
            signature: Some(signature),
            body,
        }
    }

    fn pull_request_payload(action: &str) -> serde_json::Value {
        json!({
            "action": action,
            "pull_request": {
                "number": 12,
                "head": {
                    "ref": "feature/x",
                    "repo": {"name": "widget", "owner": {"login": "forker"}}
                }
            },
            "repository": {"name": "widget", "owner": {"login": "acme"}},
            "installation": {"id": 99}
        })
    }

    fn comment_payload(action: &str, body: &str, on_pull_request: bool) -> serde_json::Value {
        let mut issue = json!({"number": 12});
        if on_pull_request {
            issue["pull_request"] = json!({"url": "https://api.github.com/x"});
        }
        json!({
            "action": action,
            "issue": issue,
            "comment": {"body": body},
            "repository": {"name": "widget", "owner": {"login": "acme"}}
        })
    }

    #[test]
    fn non_post_is_rejected_before_payload_inspection() {
        let mut d = delivery(Some("pull_request"), &pull_request_payload("opened"));
        d.method = "GET".to_string();
        d.body = b"not even json".to_vec();
        let result = dispatch(&d, &verifier());
        assert!(matches!(
            result,
            Dispatch::Rejected(Rejection::MethodNotAllowed { .. })
        ));
        assert_eq!(result.http_status(), 405);
    }

    #[test]
    fn bad_signature_is_unauthorized() {
        let mut d = delivery(Some("pull_request"), &pull_request_payload("opened"));
        d.signature = Some("sha256=0000".to_string());
        let result = dispatch(&d, &verifier());
        assert_eq!(result.http_status(), 401);
    }

    #[test]
    fn missing_event_header_is_bad_request() {
        let d = delivery(None, &pull_request_payload("opened"));
        let result = dispatch(&d, &verifier());
        assert_eq!(result, Dispatch::Rejected(Rejection::MissingEventHeader));
        assert_eq!(result.http_status(), 400);
    }

    #[test]
    fn unknown_event_type_is_ignored_not_failed() {
        let d = delivery(Some("push"), &json!({"anything": true}));
        let result = dispatch(&d, &verifier());
        assert_eq!(
            result,
            Dispatch::Ignored(IgnoreReason::UnsupportedEvent {
                event: "push".to_string()
            })
        );
        assert_eq!(result.http_status(), 200);
    }

    #[test]
    fn labeled_action_is_ignored() {
        let d = delivery(Some("pull_request"), &pull_request_payload("labeled"));
        let result = dispatch(&d, &verifier());
        assert_eq!(
            result,
            Dispatch::Ignored(IgnoreReason::UnsupportedPullRequestAction)
        );
        assert_eq!(result.http_status(), 200);
    }

    #[test]
    fn opened_synchronize_reopened_all_run() {
        for action in ["opened", "synchronize", "reopened"] {
            let d = delivery(Some("pull_request"), &pull_request_payload(action));
            match dispatch(&d, &verifier()) {
                Dispatch::Run(request) => {
                    assert_eq!(request.trigger, SyncTrigger::PullRequestUpdate);
                    assert_eq!(request.owner, "acme");
                    assert_eq!(request.number, 12);
                    assert_eq!(request.installation_id, Some(99));
                    let head = request.head.expect("head from payload");
                    assert_eq!(head.owner, "forker");
                    assert_eq!(head.branch, "feature/x");
                }
                other => panic!("expected Run for {action}, got {other:?}"),
            }
        }
    }

    #[test]
    fn deleted_head_repo_yields_no_head_ref() {
        let mut payload = pull_request_payload("opened");
        payload["pull_request"]["head"]["repo"] = serde_json::Value::Null;
        let d = delivery(Some("pull_request"), &payload);
        match dispatch(&d, &verifier()) {
            Dispatch::Run(request) => assert!(request.head.is_none()),
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn malformed_payload_is_bad_request() {
        let d = delivery(Some("pull_request"), &json!({"action": "opened"}));
        let result = dispatch(&d, &verifier());
        assert!(matches!(
            result,
            Dispatch::Rejected(Rejection::MalformedPayload { .. })
        ));
        assert_eq!(result.http_status(), 400);
    }

    #[test]
    fn apply_command_on_pull_request_runs() {
        let d = delivery(
            Some("issue_comment"),
            &comment_payload("created", APPLY_COMMAND, true),
        );
        match dispatch(&d, &verifier()) {
            Dispatch::Run(request) => {
                assert_eq!(request.trigger, SyncTrigger::ApplyCommand);
                assert!(request.head.is_none());
                assert_eq!(request.installation_id, None);
            }
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn surrounding_whitespace_around_command_is_trimmed() {
        let body = format!("  {APPLY_COMMAND}\n");
        let d = delivery(Some("issue_comment"), &comment_payload("created", &body, true));
        assert!(matches!(dispatch(&d, &verifier()), Dispatch::Run(_)));
    }

    #[test]
    fn internal_whitespace_in_command_is_not_normalized() {
        let d = delivery(
            Some("issue_comment"),
            &comment_payload("created", "@readme-sync  apply", true),
        );
        assert_eq!(
            dispatch(&d, &verifier()),
            Dispatch::Ignored(IgnoreReason::NotTheApplyCommand)
        );
    }

    #[test]
    fn comment_on_plain_issue_is_ignored() {
        let d = delivery(
            Some("issue_comment"),
            &comment_payload("created", APPLY_COMMAND, false),
        );
        assert_eq!(
            dispatch(&d, &verifier()),
            Dispatch::Ignored(IgnoreReason::NotAPullRequest)
        );
    }

    #[test]
    fn edited_comment_is_ignored() {
        let d = delivery(
            Some("issue_comment"),
            &comment_payload("edited", APPLY_COMMAND, true),
        );
        assert_eq!(
            dispatch(&d, &verifier()),
            Dispatch::Ignored(IgnoreReason::UnsupportedCommentAction)
        );
    }
}

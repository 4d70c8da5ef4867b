//! Webhook HTTP endpoint.
//!
//! Thin axum wiring: assemble the [`Delivery`] record, hand it to the
//! library dispatcher, and translate outcomes into HTTP statuses. All
//! decisions live in the library.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::any;
use axum::Router;
use readme_sync::{
    dispatch, AnalysisClient, ClientCache, Delivery, Dispatch, RepoClient, SignatureVerifier,
    SyncRequest, Syncer,
};
use readme_sync::webhook::{DELIVERY_ID_HEADER, EVENT_HEADER, SIGNATURE_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state for the webhook handler.
pub struct AppState {
    /// Installation-scoped client cache (process lifetime).
    pub cache: ClientCache,

    /// Model client shared across deliveries.
    pub analyzer: AnalysisClient,

    /// Mandatory delivery-signature verifier.
    pub verifier: SignatureVerifier,

    /// Whether deliveries may commit, or only comment.
    pub auto_commit: bool,
}

/// Runs the webhook endpoint until the process is stopped.
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn serve(
    bind: SocketAddr,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = Router::new()
        .route("/webhook", any(handle_webhook))
        .with_state(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "Listening for webhook deliveries");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let delivery = Delivery {
        method: method.to_string(),
        event: header_value(&headers, EVENT_HEADER),
        delivery_id: header_value(&headers, DELIVERY_ID_HEADER),
        signature: header_value(&headers, SIGNATURE_HEADER),
        body: body.to_vec(),
    };

    match dispatch(&delivery, &state.verifier) {
        Dispatch::Run(request) => run_request(&state, request).await,
        Dispatch::Ignored(reason) => (StatusCode::OK, format!("ignored: {reason:?}")),
        Dispatch::Rejected(rejection) => (
            StatusCode::from_u16(rejection.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            format!("rejected: {rejection:?}"),
        ),
    }
}

async fn run_request(state: &AppState, request: SyncRequest) -> (StatusCode, String) {
    let octocrab = match state.cache.client_for(request.installation_id) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to resolve installation client");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("client error: {e}"),
            );
        }
    };

    let syncer = Syncer::new(
        RepoClient::new(octocrab),
        state.analyzer.clone(),
        state.auto_commit,
    );

    match syncer.run(&request).await {
        Ok(outcome) => (StatusCode::OK, format!("handled: {}", outcome.as_str())),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

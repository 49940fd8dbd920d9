// src/api.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use metrics::counter;
use tower_http::trace::TraceLayer;

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::ticket::{JiraExtractor, PayloadExtractor, ServiceNowExtractor};

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    servicenow: Arc<ServiceNowExtractor>,
    jira: Arc<JiraExtractor>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, jira: JiraExtractor) -> Self {
        Self {
            dispatcher,
            servicenow: Arc::new(ServiceNowExtractor),
            jira: Arc::new(jira),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/servicenow/{record}", post(servicenow_webhook))
        .route("/jira/{issue_key}", post(jira_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type HandlerResult = Result<StatusCode, (StatusCode, String)>;

async fn servicenow_webhook(
    State(state): State<AppState>,
    Path(record): Path<String>,
    body: Bytes,
) -> HandlerResult {
    handle_webhook(&state, state.servicenow.as_ref(), &record, &body)
}

async fn jira_webhook(
    State(state): State<AppState>,
    Path(issue_key): Path<String>,
    body: Bytes,
) -> HandlerResult {
    handle_webhook(&state, state.jira.as_ref(), &issue_key, &body)
}

/// 200 with an empty body for both new and duplicate tickets; 400 when the
/// body is not JSON or lacks a required field.
fn handle_webhook(
    state: &AppState,
    extractor: &dyn PayloadExtractor,
    ticket_id: &str,
    body: &[u8],
) -> HandlerResult {
    let platform = extractor.platform();
    counter!("webhooks_received_total", "platform" => platform.as_str()).increment(1);

    // Parsed from raw bytes: the ServiceNow business rule sends no Content-Type.
    let json: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(target: "api", %platform, ticket_id, error = %e, "webhook body is not JSON");
        (StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}"))
    })?;

    let event = extractor.extract(ticket_id, &json).map_err(|e| {
        tracing::warn!(target: "api", %platform, ticket_id, error = %e, "webhook rejected");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    match state.dispatcher.handle(&event) {
        DispatchOutcome::Dispatched | DispatchOutcome::SkippedDuplicate => Ok(StatusCode::OK),
    }
}

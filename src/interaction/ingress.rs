//! GitHub webhook endpoint.
//!
//! Accepts release deliveries, filters them down to `released` events for the
//! watched repository, and publishes the raw payload to the event channel.
//! Every filtered-out delivery is answered with `200` since GitHub retries
//! anything else.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::{
    base::types::{RepoFilter, WebhookEnvelope},
    service::events::EventChannel,
};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Event type GitHub sends when a webhook is first configured.
const PING_EVENT: &str = "ping";
/// The only action that is relayed.
const RELEASED_ACTION: &str = "released";

/// Body returned for ping deliveries.
pub const PING_RESPONSE: &str = "pong";
/// Body returned once a release has been handed to the event channel.
pub const PUBLISHED_RESPONSE: &str = "published release event";

/// Faults that end a delivery with a server error.
#[derive(Debug, Error)]
pub enum IngressError {
    /// The body is not valid UTF-8.
    #[error("malformed webhook payload: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    /// The body is not JSON.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The event channel refused the payload.
    #[error("failed to publish release event: {0}")]
    Publish(anyhow::Error),
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        error!("Failed to handle webhook delivery: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct IngressState {
    repo: RepoFilter,
    events: EventChannel,
}

impl IngressState {
    pub fn new(repo: RepoFilter, events: EventChannel) -> Self {
        Self { repo, events }
    }
}

/// Builds the router serving `POST /payload` and `GET /health`.
pub fn router(state: IngressState) -> Router {
    Router::new()
        .route("/payload", post(handle_payload))
        .route("/health", get(health))
        .with_state(state)
}

/// Webhook handler.
///
/// - `X-GitHub-Event: ping` is acknowledged without reading the body.
/// - Actions other than `released` are skipped.
/// - Releases of other repositories are skipped.
/// - Anything else is published, and the response is sent without waiting for delivery.
#[instrument(skip_all)]
pub async fn handle_payload(State(state): State<IngressState>, headers: HeaderMap, body: Bytes) -> Result<(StatusCode, String), IngressError> {
    let event_type = headers.get(HEADER_EVENT).and_then(|v| v.to_str().ok()).unwrap_or_default();

    if event_type == PING_EVENT {
        info!("Received ping delivery.");
        return Ok((StatusCode::OK, PING_RESPONSE.to_string()));
    }

    let payload = String::from_utf8(body.to_vec())?;
    let envelope = WebhookEnvelope::from_json(&payload)?;

    if envelope.action != RELEASED_ACTION {
        debug!(action = %envelope.action, "Skipping delivery.");
        return Ok((StatusCode::OK, format!("skipping event type with type '{}'", envelope.action)));
    }

    let full_name = envelope.full_name.as_str();

    if !state.repo.matches(full_name) {
        debug!(repository = %full_name, "Skipping release for unwatched repository.");
        return Ok((StatusCode::OK, format!("skipping release for repo '{full_name}'")));
    }

    state.events.publish(payload).map_err(IngressError::Publish)?;

    info!(repository = %full_name, "Published release event.");

    Ok((StatusCode::OK, PUBLISHED_RESPONSE.to_string()))
}

/// Liveness check.
async fn health() -> &'static str {
    "OK"
}

// Tests.

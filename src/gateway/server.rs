//! Gateway server implementation
//!
//! One axum router: the Slack events endpoint (with signature verification
//! and the `url_verification` challenge handshake) and a health probe. Event
//! processing is spawned off the request path so Slack gets its ack within
//! its delivery deadline.

use crate::channels::{EventEnvelope, SlackAuth};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::gateway::handler::EventDispatcher;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Webhook signature verifier
    pub auth: Arc<SlackAuth>,
    /// Event dispatcher
    pub dispatcher: Arc<EventDispatcher>,
}

/// Build the gateway router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // The original deployment served everything at the root; keep both
        // paths so either webhook URL works.
        .route("/", post(slack_events))
        .route("/slack/events", post(slack_events))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve(config: &GatewayConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Gateway(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(addr = %addr, "Gateway listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .map_err(|e| Error::Gateway(format!("server error: {e}")))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn slack_events(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let timestamp = header_str(&headers, "x-slack-request-timestamp");
    let signature = header_str(&headers, "x-slack-signature");

    let now = chrono::Utc::now().timestamp();
    let outcome = state.auth.verify(timestamp, signature, &body, now);
    if !outcome.is_allowed() {
        tracing::warn!(outcome = ?outcome, "Rejected unauthenticated request");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!("Unparseable event payload: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match envelope.kind.as_str() {
        "url_verification" => {
            tracing::info!("Received challenge");
            Json(json!({ "challenge": envelope.challenge })).into_response()
        }
        "event_callback" => {
            if let Some(event) = envelope.event {
                let dispatcher = state.dispatcher.clone();
                // Ack immediately; Slack redelivers on slow responses.
                tokio::spawn(async move {
                    dispatcher.dispatch(event).await;
                });
            } else {
                tracing::warn!("event_callback without event payload");
            }
            Json(json!({ "ok": true })).into_response()
        }
        other => {
            tracing::debug!(kind = %other, "Ignoring unknown envelope type");
            Json(json!({ "ok": true })).into_response()
        }
    }
}

/// Header value as &str, empty when missing or non-UTF-8 (verification will
/// then reject the request)
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_str() {
        let mut headers = HeaderMap::new();
        headers.insert("x-slack-signature", HeaderValue::from_static("v0=abc"));

        assert_eq!(header_str(&headers, "x-slack-signature"), "v0=abc");
        assert_eq!(header_str(&headers, "x-slack-request-timestamp"), "");
    }

    #[test]
    fn test_challenge_envelope_round_trip() {
        let body = br#"{"type": "url_verification", "challenge": "xyz"}"#;
        let envelope: EventEnvelope = serde_json::from_slice(body).unwrap();
        assert_eq!(envelope.kind, "url_verification");

        let reply = json!({ "challenge": envelope.challenge });
        assert_eq!(reply["challenge"], "xyz");
    }
}

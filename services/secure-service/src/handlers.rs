//! HTTP handlers: the thin facade over the session manager.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;
use vault_session::{SessionError, SessionHealth, SessionManager};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The authenticated Vault session
    pub session: Arc<SessionManager>,
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/payments", post(create_payment))
        .layer(TraceLayer::new_for_http())
        // healthcheck sits outside the trace layer so probes stay out of the logs
        .route("/healthcheck", get(healthcheck))
        .with_state(state)
}

/// Reports session health so external monitoring can detect the degraded
/// state a dead renewal loop leaves behind.
async fn healthcheck(State(state): State<AppState>) -> Response {
    match state.session.health() {
        SessionHealth::Active => (StatusCode::OK, "OK").into_response(),
        health => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("vault session is {health}"),
        )
            .into_response(),
    }
}

/// Demonstrates fetching the static API key secret from Vault and handing
/// it to the caller.
async fn create_payment(State(state): State<AppState>) -> Response {
    let record = match state.session.read_secret().await {
        Ok(record) => record,
        Err(err) => {
            warn!(error = %err, "secret read failed");
            let status = match &err {
                SessionError::SessionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                SessionError::AuthRejected(_) | SessionError::LeaseExpired(_) => {
                    StatusCode::UNAUTHORIZED
                }
                _ => StatusCode::BAD_GATEWAY,
            };
            return error_response(status, &err.to_string());
        }
    };

    // check that our expected key is in the returned secret
    match record.get("api_key") {
        Some(api_key) => (StatusCode::OK, Json(serde_json::json!(api_key))).into_response(),
        None => error_response(
            StatusCode::UNAUTHORIZED,
            "the secret retrieved from vault is missing 'api_key' field",
        ),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

//! The HTTP surface.
//!
//! Three routes: a banner for humans poking the root, a health probe, and
//! the activity endpoint the channel posts to. The endpoint answers 200
//! once the activity has been processed; processing failures are handled
//! in-band and never turn into HTTP errors.

use crate::error::ApiError;
use crate::reply::HttpReplyChannel;
use crate::service::BotService;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::{Router, extract::State};
use herald_activity::Activity;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared state behind the routes.
#[derive(Clone)]
pub struct AppState {
    /// The bot service processing activities.
    pub service: Arc<BotService>,
    /// The outbound channel, for recording per-conversation reply routes.
    pub reply_routes: Arc<HttpReplyChannel>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/healthz", get(healthz))
        .route("/api/messages", post(receive_activity))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn banner() -> &'static str {
    "herald is running."
}

async fn healthz() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

/// Receives one channel activity.
async fn receive_activity(
    State(state): State<AppState>,
    Json(body): Json<JsonValue>,
) -> Result<StatusCode, ApiError> {
    let activity: Activity =
        serde_json::from_value(body).map_err(|e| ApiError::InvalidActivity {
            details: e.to_string(),
        })?;

    if activity.conversation_id().as_str().is_empty() {
        return Err(ApiError::MissingConversation);
    }

    if let Some(service_url) = &activity.service_url {
        state
            .reply_routes
            .note_route(activity.conversation_id(), service_url);
    }

    debug!(
        conversation = %activity.conversation_id(),
        activity_type = %activity.activity_type,
        "activity received"
    );

    state.service.handle(activity).await;
    Ok(StatusCode::OK)
}

//! Error types for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

/// Errors answered to the channel by the activity endpoint.
///
/// Processing failures never surface here; the service logs them and
/// answers the user in-band. The endpoint only rejects requests it cannot
/// turn into an activity at all.
#[derive(Debug)]
pub enum ApiError {
    /// The request body was not a valid activity.
    InvalidActivity { details: String },
    /// The activity carried no conversation to route replies to.
    MissingConversation,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidActivity { details } => {
                write!(f, "invalid activity payload: {details}")
            }
            Self::MissingConversation => {
                write!(f, "activity has no conversation id")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidActivity { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid activity payload")
            }
            Self::MissingConversation => {
                (StatusCode::BAD_REQUEST, "Activity has no conversation id")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_activity_maps_to_bad_request() {
        let response = ApiError::InvalidActivity {
            details: "expected object".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

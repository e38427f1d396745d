use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure fetching one upstream part of the greeting.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{service} service unreachable: {source}")]
    Unreachable {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} service returned {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{service} service sent a malformed body: {source}")]
    Malformed {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error!(error = %self, "gateway request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

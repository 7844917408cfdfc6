use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::gateway::types::{ErrorBody, FALLBACK_ERROR_MESSAGE};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The upstream answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },
    /// The upstream could not be reached.
    #[error("{0}")]
    Transport(String),
    /// The upstream answered with a body that is not the expected JSON.
    #[error("{0}")]
    Decode(String),
    #[error("Failed to retrieve session token")]
    EmptyToken,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Transport(_) | GatewayError::Decode(_) | GatewayError::EmptyToken => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayError::Upstream { .. } => "upstream_rejected",
            GatewayError::Transport(_) => "transport_failed",
            GatewayError::Decode(_) => "decode_failed",
            GatewayError::EmptyToken => "empty_token",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // Plain text body, unlike every other failure.
            GatewayError::EmptyToken => (status, FALLBACK_ERROR_MESSAGE).into_response(),
            other => (
                status,
                Json(ErrorBody {
                    error: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

//! Session token gateway: exchanges the server-held API key for a short-lived
//! session token, applying caller overrides on top of the configured persona.

pub mod error;
pub mod issuer;
pub mod types;

pub use error::GatewayError;
pub use issuer::{HttpTokenIssuer, TokenIssuer, TOKEN_PATH};
pub use types::{
    AvatarPersona, ErrorBody, OverrideParameters, SessionDescriptor, SessionMode, TokenRequest,
    FALLBACK_ERROR_MESSAGE,
};

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::telemetry::events::record_token_exchange;

pub const START_SESSION_ROUTE: &str = "/api/start-session";

#[derive(Clone)]
pub struct TokenGateway {
    config: Arc<GatewayConfig>,
    issuer: Arc<dyn TokenIssuer>,
}

impl std::fmt::Debug for TokenGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGateway")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

impl TokenGateway {
    pub fn new(config: GatewayConfig, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self {
            config: Arc::new(config),
            issuer,
        }
    }

    /// Builds a gateway that talks to the configured upstream over HTTP.
    pub fn from_config(config: GatewayConfig) -> Self {
        let issuer = Arc::new(HttpTokenIssuer::new(&config));
        Self::new(config, issuer)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Merges overrides with the configured defaults.
    pub fn resolve_request(&self, overrides: &OverrideParameters) -> TokenRequest {
        let pick = |value: &Option<String>, default: &String| {
            value
                .as_ref()
                .filter(|value| !value.is_empty())
                .unwrap_or(default)
                .clone()
        };

        TokenRequest {
            mode: SessionMode::Full,
            avatar_id: pick(&overrides.avatar_id, &self.config.default_avatar_id),
            avatar_persona: AvatarPersona {
                voice_id: pick(&overrides.voice_id, &self.config.default_voice_id),
                context_id: pick(&overrides.context_id, &self.config.default_context_id),
                language: self.config.default_language.clone(),
            },
        }
    }

    /// Performs exactly one upstream call.
    pub async fn exchange(
        &self,
        overrides: OverrideParameters,
    ) -> Result<SessionDescriptor, GatewayError> {
        let started = Instant::now();
        let request = self.resolve_request(&overrides);
        let overridden = [
            overrides.avatar_id.is_some(),
            overrides.voice_id.is_some(),
            overrides.context_id.is_some(),
        ];

        let result = self.issuer.issue(&request).await;
        match &result {
            Ok(descriptor) => {
                info!(
                    target: "token_gateway",
                    session_id = %descriptor.session_id,
                    avatar_id = %request.avatar_id,
                    "session token issued"
                );
                record_token_exchange(
                    "issued",
                    StatusCode::OK.as_u16(),
                    overridden,
                    started.elapsed(),
                );
            }
            Err(err) => {
                error!(
                    target: "token_gateway",
                    %err,
                    kind = err.as_str(),
                    "error retrieving session token"
                );
                record_token_exchange(
                    err.as_str(),
                    err.status().as_u16(),
                    overridden,
                    started.elapsed(),
                );
            }
        }
        result
    }
}

pub fn router(gateway: TokenGateway) -> Router {
    Router::new()
        .route(START_SESSION_ROUTE, post(start_session))
        .with_state(gateway)
}

/// An unreadable or oversized body counts as no overrides.
async fn start_session(
    State(gateway): State<TokenGateway>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let overrides = match body {
        Ok(body) => OverrideParameters::from_body(&body),
        Err(rejection) => {
            warn!(
                target: "token_gateway",
                %rejection,
                "ignoring unreadable request body"
            );
            OverrideParameters::default()
        }
    };
    match gateway.exchange(overrides).await {
        Ok(descriptor) => (StatusCode::OK, Json(descriptor)).into_response(),
        Err(err) => err.into_response(),
    }
}

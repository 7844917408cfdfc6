//! Where a coordinator gets its session tokens from.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::gateway::types::{
    ErrorBody, OverrideParameters, SessionDescriptor, FALLBACK_ERROR_MESSAGE,
};
use crate::gateway::{GatewayError, TokenGateway, START_SESSION_ROUTE};

const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenRequestError {
    /// The gateway answered with an error status; `message` is its `error` text.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("token gateway unreachable: {0}")]
    Transport(String),
    #[error("invalid token gateway response: {0}")]
    Decode(String),
    #[error("token gateway returned an empty session token")]
    EmptyToken,
}

impl From<GatewayError> for TokenRequestError {
    fn from(err: GatewayError) -> Self {
        TokenRequestError::Rejected {
            status: err.status().as_u16(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn request_token(
        &self,
        overrides: OverrideParameters,
    ) -> Result<SessionDescriptor, TokenRequestError>;
}

/// In-process token source, skipping the HTTP hop.
#[async_trait]
impl TokenSource for TokenGateway {
    async fn request_token(
        &self,
        overrides: OverrideParameters,
    ) -> Result<SessionDescriptor, TokenRequestError> {
        Ok(self.exchange(overrides).await?)
    }
}

/// HTTP client of the gateway's start-session route.
#[derive(Clone)]
pub struct GatewayClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// `base_url` is the gateway origin, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, DEFAULT_CLIENT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), START_SESSION_ROUTE),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenSource for GatewayClient {
    async fn request_token(
        &self,
        overrides: OverrideParameters,
    ) -> Result<SessionDescriptor, TokenRequestError> {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();

        tokio::task::spawn_blocking(move || post_start_session(&agent, &endpoint, &overrides))
            .await
            .map_err(|err| TokenRequestError::Transport(format!("token request task failed: {err}")))?
    }
}

fn post_start_session(
    agent: &ureq::Agent,
    endpoint: &str,
    overrides: &OverrideParameters,
) -> Result<SessionDescriptor, TokenRequestError> {
    let response = match agent.post(endpoint).send_json(overrides) {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            return Err(TokenRequestError::Rejected {
                status,
                message: gateway_error_message(&body),
            });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(TokenRequestError::Transport(transport.to_string()));
        }
    };

    let descriptor: SessionDescriptor = response
        .into_json()
        .map_err(|err| TokenRequestError::Decode(err.to_string()))?;

    if descriptor.session_token.is_empty() {
        return Err(TokenRequestError::EmptyToken);
    }
    Ok(descriptor)
}

/// The gateway sends `{"error": ...}` for most failures and plain text for
/// the empty-token case.
fn gateway_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}

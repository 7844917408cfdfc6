use async_trait::async_trait;
use tracing::warn;

use crate::config::GatewayConfig;
use crate::gateway::error::GatewayError;
use crate::gateway::types::{
    upstream_error_message, SessionDescriptor, TokenRequest, UpstreamTokenEnvelope,
};

pub const TOKEN_PATH: &str = "/v1/sessions/token";
const API_KEY_HEADER: &str = "X-API-KEY";

/// Upstream seam of the gateway: turns a resolved request into a session token.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, request: &TokenRequest) -> Result<SessionDescriptor, GatewayError>;
}

/// Issues tokens by calling the upstream HTTP API. Each call is one POST; nothing is cached.
#[derive(Clone)]
pub struct HttpTokenIssuer {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for HttpTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTokenIssuer")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpTokenIssuer {
    pub fn new(config: &GatewayConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.upstream_timeout)
            .build();
        Self {
            agent,
            endpoint: format!("{}{}", config.api_url, TOKEN_PATH),
            api_key: config.api_key.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenIssuer for HttpTokenIssuer {
    async fn issue(&self, request: &TokenRequest) -> Result<SessionDescriptor, GatewayError> {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || post_token_request(&agent, &endpoint, &api_key, &request))
            .await
            .map_err(|err| GatewayError::Transport(format!("token request task failed: {err}")))?
    }
}

fn post_token_request(
    agent: &ureq::Agent,
    endpoint: &str,
    api_key: &str,
    request: &TokenRequest,
) -> Result<SessionDescriptor, GatewayError> {
    let response = match agent
        .post(endpoint)
        .set(API_KEY_HEADER, api_key)
        .set("Content-Type", "application/json")
        .send_json(request)
    {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            let message = upstream_error_message(&body);
            warn!(
                target: "token_gateway",
                status,
                %message,
                "upstream rejected token request"
            );
            return Err(GatewayError::Upstream { status, message });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(GatewayError::Transport(transport.to_string()));
        }
    };

    let envelope: UpstreamTokenEnvelope = response
        .into_json()
        .map_err(|err| GatewayError::Decode(format!("invalid upstream token response: {err}")))?;

    envelope.into_descriptor()
}

use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) const TOKEN_TARGET: &str = "telemetry::token_gateway";
pub(crate) const SESSION_TARGET: &str = "telemetry::session";
pub(crate) const EVENT_TOKEN_EXCHANGE: &str = "token_exchange";
pub(crate) const EVENT_TOKEN_REQUEST: &str = "token_request";
pub(crate) const EVENT_SESSION_COMMAND: &str = "session_command";

#[derive(Debug, Serialize)]
pub struct TokenExchangeEvent {
    pub outcome: &'static str,
    pub status: u16,
    pub avatar_overridden: bool,
    pub voice_overridden: bool,
    pub context_overridden: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct TokenRequestEvent {
    pub purpose: &'static str,
    pub succeeded: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionCommandEvent {
    pub command: &'static str,
    pub succeeded: bool,
    pub latency_ms: u64,
}

/// Records one gateway invocation; `status` is the HTTP status relayed to the caller.
pub fn record_token_exchange(
    outcome: &'static str,
    status: u16,
    overridden: [bool; 3],
    latency: Duration,
) {
    let [avatar_overridden, voice_overridden, context_overridden] = overridden;
    let event = TokenExchangeEvent {
        outcome,
        status,
        avatar_overridden,
        voice_overridden,
        context_overridden,
        latency_ms: duration_to_ms(latency),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TOKEN_TARGET,
            event = EVENT_TOKEN_EXCHANGE,
            outcome = event.outcome,
            status = event.status,
            latency_ms = event.latency_ms,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TOKEN_TARGET,
            event = EVENT_TOKEN_EXCHANGE,
            %err,
            "failed to encode token exchange event"
        ),
    }
}

/// Records a token request issued by a session coordinator.
pub fn record_token_request(purpose: &'static str, succeeded: bool, latency: Duration) {
    let event = TokenRequestEvent {
        purpose,
        succeeded,
        latency_ms: duration_to_ms(latency),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: SESSION_TARGET,
            event = EVENT_TOKEN_REQUEST,
            purpose = event.purpose,
            succeeded = event.succeeded,
            latency_ms = event.latency_ms,
            payload = %payload
        ),
        Err(err) => warn!(
            target: SESSION_TARGET,
            event = EVENT_TOKEN_REQUEST,
            %err,
            "failed to encode token request event"
        ),
    }
}

/// Records one call into the avatar SDK or the fullscreen surface.
pub fn record_session_command(command: &'static str, succeeded: bool, latency: Duration) {
    let event = SessionCommandEvent {
        command,
        succeeded,
        latency_ms: duration_to_ms(latency),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: SESSION_TARGET,
            event = EVENT_SESSION_COMMAND,
            command = event.command,
            succeeded = event.succeeded,
            latency_ms = event.latency_ms,
            payload = %payload
        ),
        Err(err) => warn!(
            target: SESSION_TARGET,
            event = EVENT_SESSION_COMMAND,
            %err,
            "failed to encode session command event"
        ),
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}

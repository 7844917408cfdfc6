//! Wire types shared by the token gateway, the upstream token API and gateway clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::GatewayError;

/// Message used whenever the upstream gives no usable token or error text.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to retrieve session token";

/// Operating mode requested from the upstream service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionMode {
    #[default]
    Full,
    Custom,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Full => "FULL",
            SessionMode::Custom => "CUSTOM",
        }
    }
}

/// Caller supplied overrides for the persona defaults.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl OverrideParameters {
    /// Builds overrides from free-form input fields, dropping blank ones.
    pub fn from_fields(avatar_id: &str, voice_id: &str, context_id: &str) -> Self {
        Self {
            avatar_id: non_empty(avatar_id),
            voice_id: non_empty(voice_id),
            context_id: non_empty(context_id),
        }
    }

    /// Leniently decodes a request body. Anything that is not a JSON object
    /// yields no overrides; non-string fields are ignored individually.
    pub fn from_body(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }

        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => return Self::default(),
        };

        let field = |name: &str| value.get(name).and_then(Value::as_str).and_then(non_empty);

        Self {
            avatar_id: field("avatar_id"),
            voice_id: field("voice_id"),
            context_id: field("context_id"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.avatar_id.is_none() && self.voice_id.is_none() && self.context_id.is_none()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Voice, context and language applied to an avatar session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarPersona {
    pub voice_id: String,
    pub context_id: String,
    pub language: String,
}

/// Body posted to the upstream token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub mode: SessionMode,
    pub avatar_id: String,
    pub avatar_persona: AvatarPersona,
}

/// Short-lived credential pair for one avatar streaming session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub session_token: String,
    pub session_id: String,
}

/// JSON error body returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UpstreamTokenEnvelope {
    #[serde(default)]
    data: Option<UpstreamTokenData>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamTokenData {
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

impl UpstreamTokenEnvelope {
    /// A reply without a `data` object is malformed; one whose token is
    /// missing or empty is [`GatewayError::EmptyToken`].
    pub(crate) fn into_descriptor(self) -> Result<SessionDescriptor, GatewayError> {
        let data = self.data.ok_or_else(|| {
            GatewayError::Decode("upstream token response has no data object".to_string())
        })?;
        let session_token = data
            .session_token
            .filter(|token| !token.is_empty())
            .ok_or(GatewayError::EmptyToken)?;
        Ok(SessionDescriptor {
            session_token,
            session_id: data.session_id.unwrap_or_default(),
        })
    }
}

/// Extracts `data[0].message` from an upstream error payload.
pub(crate) fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/data/0/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}

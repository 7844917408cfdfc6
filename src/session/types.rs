use serde::{Deserialize, Serialize};

use crate::gateway::types::{OverrideParameters, SessionDescriptor};

/// Connection state reported by the avatar SDK. Owned by the SDK; the
/// coordinator only mirrors it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[default]
    Inactive,
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Inactive => "INACTIVE",
            SessionState::Connecting => "CONNECTING",
            SessionState::Connected => "CONNECTED",
            SessionState::Disconnecting => "DISCONNECTING",
            SessionState::Disconnected => "DISCONNECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionQuality {
    #[default]
    Unknown,
    Good,
    Bad,
}

impl ConnectionQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionQuality::Unknown => "UNKNOWN",
            ConnectionQuality::Good => "GOOD",
            ConnectionQuality::Bad => "BAD",
        }
    }
}

/// Local chat intent. Voice and text chat are exclusive by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatMode {
    #[default]
    Idle,
    /// Voice chat requested; starts once the stream is ready.
    VoicePending,
    Voice,
    Text,
}

impl ChatMode {
    pub fn is_voice_pending(&self) -> bool {
        matches!(self, ChatMode::VoicePending)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ChatMode::Text)
    }
}

/// Everything the SDK reports about the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedSession {
    pub state: SessionState,
    pub stream_ready: bool,
    pub voice_active: bool,
    pub voice_loading: bool,
    pub muted: bool,
    pub user_talking: bool,
    pub avatar_talking: bool,
    pub connection_quality: ConnectionQuality,
}

/// A single state report from the avatar SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkUpdate {
    SessionState(SessionState),
    StreamReady(bool),
    VoiceChatActive(bool),
    VoiceChatLoading(bool),
    Muted(bool),
    UserTalking(bool),
    AvatarTalking(bool),
    ConnectionQuality(ConnectionQuality),
}

/// User actions forwarded from the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    StartVoiceChat,
    StartTextChat,
    ToggleMute,
    ToggleFullscreen,
    ToggleSettings,
    SetCustomAvatarId(String),
    SetCustomVoiceId(String),
    SetCustomContextId(String),
    SetMessage(String),
    SendMessage,
    RepeatMessage,
    StartListening,
    StopListening,
    Interrupt,
    KeepAlive,
}

/// Why a token was requested; decides the chat mode once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    VoiceChat,
    TextChat,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::VoiceChat => "voice_chat",
            TokenPurpose::TextChat => "text_chat",
        }
    }
}

/// Notifications delivered to whoever embeds the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleNotice {
    SessionStopped,
    VoiceChatStarted,
}

/// Input of the coordinator reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    User(UserIntent),
    Sdk(SdkUpdate),
    /// Platform fullscreen notification; `true` while the container is fullscreen.
    FullscreenChanged(bool),
    TokenIssued {
        purpose: TokenPurpose,
        descriptor: SessionDescriptor,
    },
    TokenFailed {
        purpose: TokenPurpose,
        message: String,
    },
}

/// Side effects requested by the reducer, executed in order by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    RequestToken {
        purpose: TokenPurpose,
        overrides: OverrideParameters,
    },
    StartSession {
        session_token: String,
    },
    StopSession,
    AttachMedia,
    StartVoiceChat,
    StopVoiceChat,
    Mute,
    Unmute,
    SendMessage(String),
    Repeat(String),
    StartListening,
    StopListening,
    Interrupt,
    KeepAlive,
    RequestFullscreen,
    ExitFullscreen,
    Notify(LifecycleNotice),
}

impl SessionCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionCommand::RequestToken { .. } => "request_token",
            SessionCommand::StartSession { .. } => "start_session",
            SessionCommand::StopSession => "stop_session",
            SessionCommand::AttachMedia => "attach_media",
            SessionCommand::StartVoiceChat => "start_voice_chat",
            SessionCommand::StopVoiceChat => "stop_voice_chat",
            SessionCommand::Mute => "mute",
            SessionCommand::Unmute => "unmute",
            SessionCommand::SendMessage(_) => "send_message",
            SessionCommand::Repeat(_) => "repeat",
            SessionCommand::StartListening => "start_listening",
            SessionCommand::StopListening => "stop_listening",
            SessionCommand::Interrupt => "interrupt",
            SessionCommand::KeepAlive => "keep_alive",
            SessionCommand::RequestFullscreen => "request_fullscreen",
            SessionCommand::ExitFullscreen => "exit_fullscreen",
            SessionCommand::Notify(_) => "notify",
        }
    }
}

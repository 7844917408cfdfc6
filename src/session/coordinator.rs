//! Session lifecycle reducer.
//!
//! The avatar SDK owns the real session state machine. The coordinator keeps
//! the local flags that overlay it and turns (local flags, observed SDK state,
//! user intent) into an ordered list of [`SessionCommand`]s. It performs no
//! I/O itself, so every transition can be exercised without an SDK.

use std::mem;

use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;
use crate::gateway::types::{OverrideParameters, SessionDescriptor, SessionMode};
use crate::session::types::{
    ChatMode, CoordinatorEvent, LifecycleNotice, ObservedSession, SdkUpdate, SessionCommand,
    SessionState, TokenPurpose, UserIntent,
};

#[derive(Debug, Clone)]
pub struct SessionCoordinator {
    mode: SessionMode,
    session: Option<SessionDescriptor>,
    chat: ChatMode,
    observed: ObservedSession,
    fullscreen: bool,
    settings_visible: bool,
    custom_avatar_id: String,
    custom_voice_id: String,
    custom_context_id: String,
    message: String,
    last_error: Option<String>,
    token_in_flight: bool,
    /// Set once `StartSession` was issued for the held token.
    session_started: bool,
}

impl SessionCoordinator {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            mode: config.mode,
            session: None,
            chat: ChatMode::Idle,
            observed: ObservedSession::default(),
            fullscreen: false,
            settings_visible: false,
            custom_avatar_id: config.initial_avatar_id.clone().unwrap_or_default(),
            custom_voice_id: String::new(),
            custom_context_id: String::new(),
            message: String::new(),
            last_error: None,
            token_in_flight: false,
            session_started: false,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn session(&self) -> Option<&SessionDescriptor> {
        self.session.as_ref()
    }

    pub fn chat_mode(&self) -> ChatMode {
        self.chat
    }

    pub fn observed(&self) -> &ObservedSession {
        &self.observed
    }

    pub fn is_voice_pending(&self) -> bool {
        self.chat.is_voice_pending()
    }

    pub fn is_text_chat_active(&self) -> bool {
        self.chat.is_text()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_settings_visible(&self) -> bool {
        self.settings_visible
    }

    pub fn custom_avatar_id(&self) -> &str {
        &self.custom_avatar_id
    }

    pub fn custom_voice_id(&self) -> &str {
        &self.custom_voice_id
    }

    pub fn custom_context_id(&self) -> &str {
        &self.custom_context_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_token_in_flight(&self) -> bool {
        self.token_in_flight
    }

    /// Reduces one event and returns the commands to execute, in order.
    pub fn handle(&mut self, event: CoordinatorEvent) -> Vec<SessionCommand> {
        let mut commands = Vec::new();

        match event {
            CoordinatorEvent::User(intent) => self.apply_intent(intent, &mut commands),
            CoordinatorEvent::Sdk(update) => self.observe(update, &mut commands),
            CoordinatorEvent::FullscreenChanged(is_fullscreen) => {
                self.fullscreen = is_fullscreen;
            }
            CoordinatorEvent::TokenIssued {
                purpose,
                descriptor,
            } => self.token_issued(purpose, descriptor),
            CoordinatorEvent::TokenFailed { purpose, message } => {
                self.token_in_flight = false;
                warn!(
                    target: "session_coordinator",
                    purpose = purpose.as_str(),
                    %message,
                    "failed to get session token"
                );
                self.last_error = Some(message);
            }
        }

        self.reconcile(&mut commands);
        commands
    }

    fn apply_intent(&mut self, intent: UserIntent, commands: &mut Vec<SessionCommand>) {
        match intent {
            UserIntent::StartVoiceChat => self.start_voice_chat(commands),
            UserIntent::StartTextChat => self.start_text_chat(commands),
            UserIntent::ToggleMute => {
                if self.session.is_some() {
                    commands.push(if self.observed.muted {
                        SessionCommand::Unmute
                    } else {
                        SessionCommand::Mute
                    });
                }
            }
            UserIntent::ToggleFullscreen => {
                commands.push(if self.fullscreen {
                    SessionCommand::ExitFullscreen
                } else {
                    SessionCommand::RequestFullscreen
                });
            }
            UserIntent::ToggleSettings => self.settings_visible = !self.settings_visible,
            UserIntent::SetCustomAvatarId(value) => self.custom_avatar_id = value,
            UserIntent::SetCustomVoiceId(value) => self.custom_voice_id = value,
            UserIntent::SetCustomContextId(value) => self.custom_context_id = value,
            UserIntent::SetMessage(value) => self.message = value,
            UserIntent::SendMessage => {
                if let Some(message) = self.take_message() {
                    commands.push(SessionCommand::SendMessage(message));
                }
            }
            UserIntent::RepeatMessage => {
                if let Some(message) = self.take_message() {
                    commands.push(SessionCommand::Repeat(message));
                }
            }
            UserIntent::StartListening => self.delegate(SessionCommand::StartListening, commands),
            UserIntent::StopListening => self.delegate(SessionCommand::StopListening, commands),
            UserIntent::Interrupt => self.delegate(SessionCommand::Interrupt, commands),
            UserIntent::KeepAlive => self.delegate(SessionCommand::KeepAlive, commands),
        }
    }

    fn start_voice_chat(&mut self, commands: &mut Vec<SessionCommand>) {
        if self.token_in_flight {
            debug!(
                target: "session_coordinator",
                "start voice chat ignored while a token request is in flight"
            );
            return;
        }

        if self.observed.voice_active {
            info!(target: "session_coordinator", "stopping voice chat and session");
            commands.push(SessionCommand::StopVoiceChat);
            commands.push(SessionCommand::StopSession);
            commands.push(SessionCommand::Notify(LifecycleNotice::SessionStopped));
            self.clear_session(commands);
            return;
        }

        let Some(session_token) = self.session.as_ref().map(|s| s.session_token.clone()) else {
            self.token_in_flight = true;
            self.last_error = None;
            commands.push(SessionCommand::RequestToken {
                purpose: TokenPurpose::VoiceChat,
                overrides: OverrideParameters::from_fields(
                    &self.custom_avatar_id,
                    &self.custom_voice_id,
                    &self.custom_context_id,
                ),
            });
            return;
        };

        if self.observed.state == SessionState::Inactive {
            self.start_session_once(session_token, commands);
            self.chat = ChatMode::VoicePending;
            return;
        }

        if self.observed.stream_ready {
            commands.push(SessionCommand::StartVoiceChat);
            self.chat = ChatMode::Voice;
        } else {
            self.chat = ChatMode::VoicePending;
        }
    }

    fn start_text_chat(&mut self, commands: &mut Vec<SessionCommand>) {
        if self.token_in_flight {
            debug!(
                target: "session_coordinator",
                "start text chat ignored while a token request is in flight"
            );
            return;
        }

        let Some(session_token) = self.session.as_ref().map(|s| s.session_token.clone()) else {
            self.token_in_flight = true;
            self.last_error = None;
            commands.push(SessionCommand::RequestToken {
                purpose: TokenPurpose::TextChat,
                overrides: OverrideParameters::default(),
            });
            return;
        };

        if self.observed.state == SessionState::Inactive {
            self.start_session_once(session_token, commands);
        }
        self.chat = ChatMode::Text;
        if self.observed.voice_active {
            commands.push(SessionCommand::StopVoiceChat);
        }
    }

    fn token_issued(&mut self, purpose: TokenPurpose, descriptor: SessionDescriptor) {
        info!(
            target: "session_coordinator",
            purpose = purpose.as_str(),
            session_id = %descriptor.session_id,
            "session token received"
        );
        self.token_in_flight = false;
        self.last_error = None;
        self.session = Some(descriptor);
        self.session_started = false;
        // A new token means a fresh SDK session.
        self.observed = ObservedSession::default();
        self.chat = match purpose {
            TokenPurpose::VoiceChat => ChatMode::VoicePending,
            TokenPurpose::TextChat => ChatMode::Text,
        };
    }

    fn observe(&mut self, update: SdkUpdate, commands: &mut Vec<SessionCommand>) {
        match update {
            SdkUpdate::SessionState(state) => {
                if !self.session_started {
                    debug!(
                        target: "session_coordinator",
                        state = state.as_str(),
                        "ignoring state report for a session that was never started"
                    );
                    return;
                }

                let previous = mem::replace(&mut self.observed.state, state);
                if state == SessionState::Disconnected
                    && previous != SessionState::Disconnected
                    && self.session.is_some()
                {
                    info!(target: "session_coordinator", "session disconnected");
                    commands.push(SessionCommand::Notify(LifecycleNotice::SessionStopped));
                    self.clear_session(commands);
                }
            }
            SdkUpdate::StreamReady(ready) => {
                let was_ready = mem::replace(&mut self.observed.stream_ready, ready);
                if ready && !was_ready && self.session.is_some() {
                    commands.push(SessionCommand::AttachMedia);
                }
            }
            SdkUpdate::VoiceChatActive(active) => {
                self.observed.voice_active = active;
                match (active, self.chat) {
                    (true, ChatMode::VoicePending | ChatMode::Idle) => self.chat = ChatMode::Voice,
                    (false, ChatMode::Voice) => self.chat = ChatMode::Idle,
                    _ => {}
                }
            }
            SdkUpdate::VoiceChatLoading(loading) => self.observed.voice_loading = loading,
            SdkUpdate::Muted(muted) => self.observed.muted = muted,
            SdkUpdate::UserTalking(talking) => self.observed.user_talking = talking,
            SdkUpdate::AvatarTalking(talking) => self.observed.avatar_talking = talking,
            SdkUpdate::ConnectionQuality(quality) => self.observed.connection_quality = quality,
        }
    }

    /// Reactions that depend only on the settled state.
    fn reconcile(&mut self, commands: &mut Vec<SessionCommand>) {
        let Some(session_token) = self.session.as_ref().map(|s| s.session_token.clone()) else {
            return;
        };

        if !self.session_started
            && self.observed.state == SessionState::Inactive
            && matches!(self.chat, ChatMode::VoicePending | ChatMode::Text)
        {
            commands.push(SessionCommand::StartSession { session_token });
            self.session_started = true;
        }

        if self.chat.is_voice_pending()
            && self.observed.stream_ready
            && !self.observed.voice_active
            && self.observed.state != SessionState::Inactive
        {
            commands.push(SessionCommand::StartVoiceChat);
            commands.push(SessionCommand::Notify(LifecycleNotice::VoiceChatStarted));
            self.chat = ChatMode::Voice;
        }
    }

    /// Drops the held token and every flag that depends on it.
    fn clear_session(&mut self, commands: &mut Vec<SessionCommand>) {
        self.session = None;
        self.session_started = false;
        self.chat = ChatMode::Idle;
        self.observed = ObservedSession::default();
        self.settings_visible = false;
        self.message.clear();
        if self.fullscreen {
            commands.push(SessionCommand::ExitFullscreen);
        }
    }

    /// The SDK reports `Inactive` until it connects, so a started session can still look idle.
    fn start_session_once(&mut self, session_token: String, commands: &mut Vec<SessionCommand>) {
        if !self.session_started {
            commands.push(SessionCommand::StartSession { session_token });
            self.session_started = true;
        }
    }

    fn delegate(&self, command: SessionCommand, commands: &mut Vec<SessionCommand>) {
        if self.session.is_some() {
            commands.push(command);
        }
    }

    /// The draft is kept while no session can receive it.
    fn take_message(&mut self) -> Option<String> {
        if self.session.is_none() || self.message.trim().is_empty() {
            return None;
        }
        Some(mem::take(&mut self.message))
    }
}

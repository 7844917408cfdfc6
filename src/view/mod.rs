//! Presentational view model.
//!
//! [`render`] is a pure function of [`ViewProps`]. Controls carry the
//! [`UserIntent`] they forward; nothing here mutates state.

use std::fmt;

use crate::gateway::types::SessionMode;
use crate::session::coordinator::SessionCoordinator;
use crate::session::types::{ConnectionQuality, SessionState, UserIntent};

pub const TITLE: &str = "CounselPrep - Live AI Avatar";
const IDLE_OVERLAY: &str = "Click Start Voice Chat to begin";
const LOADING_OVERLAY: &str = "Loading avatar...";

/// Flat set of values the view renders. The default is the "not yet started" view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewProps {
    pub mode: SessionMode,
    pub has_session_token: bool,
    pub error: Option<String>,
    pub is_active: bool,
    pub is_loading: bool,
    pub text_chat_active: bool,
    pub message: String,
    pub show_settings: bool,
    pub session_state: SessionState,
    pub connection_quality: ConnectionQuality,
    pub is_user_talking: bool,
    pub is_avatar_talking: bool,
    pub is_muted: bool,
    pub is_stream_ready: bool,
    pub is_fullscreen: bool,
    pub custom_avatar_id: String,
    pub custom_voice_id: String,
    pub custom_context_id: String,
}

impl ViewProps {
    pub fn from_coordinator(coordinator: &SessionCoordinator) -> Self {
        let observed = coordinator.observed();
        Self {
            mode: coordinator.mode(),
            has_session_token: coordinator.session().is_some(),
            error: coordinator.last_error().map(str::to_string),
            is_active: observed.voice_active,
            is_loading: observed.voice_loading,
            text_chat_active: coordinator.is_text_chat_active(),
            message: coordinator.message().to_string(),
            show_settings: coordinator.is_settings_visible(),
            session_state: observed.state,
            connection_quality: observed.connection_quality,
            is_user_talking: observed.user_talking,
            is_avatar_talking: observed.avatar_talking,
            is_muted: observed.muted,
            is_stream_ready: observed.stream_ready,
            is_fullscreen: coordinator.is_fullscreen(),
            custom_avatar_id: coordinator.custom_avatar_id().to_string(),
            custom_voice_id: coordinator.custom_voice_id().to_string(),
            custom_context_id: coordinator.custom_context_id().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: &'static str,
    pub enabled: bool,
    pub intent: UserIntent,
}

impl Control {
    fn new(label: &'static str, intent: UserIntent) -> Self {
        Self {
            label,
            enabled: true,
            intent,
        }
    }

    fn enabled_if(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Intent forwarded when the control is clicked; disabled controls forward nothing.
    pub fn click(&self) -> Option<UserIntent> {
        self.enabled.then(|| self.intent.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideField {
    Avatar,
    Voice,
    Context,
}

impl OverrideField {
    pub fn label(&self) -> &'static str {
        match self {
            OverrideField::Avatar => "Custom Avatar ID",
            OverrideField::Voice => "Custom Voice ID",
            OverrideField::Context => "Custom Context ID",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            OverrideField::Avatar => "Enter custom avatar ID",
            OverrideField::Voice => "Enter custom voice ID",
            OverrideField::Context => "Enter custom context ID",
        }
    }
}

/// Controlled text input; typing echoes the new value back as an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub field: OverrideField,
    pub value: String,
}

impl InputField {
    pub fn input(&self, value: impl Into<String>) -> UserIntent {
        let value = value.into();
        match self.field {
            OverrideField::Avatar => UserIntent::SetCustomAvatarId(value),
            OverrideField::Voice => UserIntent::SetCustomVoiceId(value),
            OverrideField::Context => UserIntent::SetCustomContextId(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPanel {
    pub status: Vec<StatusLine>,
    pub mute_button: Option<Control>,
    pub fields: Vec<InputField>,
    pub actions: Vec<Control>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChatPanel {
    pub message: String,
    pub send: Control,
    pub repeat: Control,
}

impl TextChatPanel {
    pub fn input(&self, value: impl Into<String>) -> UserIntent {
        UserIntent::SetMessage(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub title: &'static str,
    pub error_banner: Option<String>,
    pub voice_button: Control,
    pub video_overlay: Option<&'static str>,
    pub fullscreen_button: Control,
    pub settings_toggle: Control,
    pub settings: Option<SettingsPanel>,
    pub text_chat: Option<TextChatPanel>,
}

pub fn render(props: &ViewProps) -> SessionView {
    let error_banner = match (&props.error, props.has_session_token) {
        (Some(error), false) => Some(format!("Error getting session token: {error}")),
        _ => None,
    };

    let voice_label = if props.is_active {
        "Stop Voice Chat"
    } else {
        "Start Voice Chat"
    };

    let video_overlay = if props.is_stream_ready {
        None
    } else if props.session_state == SessionState::Inactive {
        Some(IDLE_OVERLAY)
    } else {
        Some(LOADING_OVERLAY)
    };

    let fullscreen_label = if props.is_fullscreen {
        "Exit Fullscreen"
    } else {
        "Fullscreen"
    };

    let settings_label = if props.show_settings {
        "Settings ▲"
    } else {
        "Settings ▼"
    };

    SessionView {
        title: TITLE,
        error_banner,
        voice_button: Control::new(voice_label, UserIntent::StartVoiceChat)
            .enabled_if(!props.is_loading),
        video_overlay,
        fullscreen_button: Control::new(fullscreen_label, UserIntent::ToggleFullscreen),
        settings_toggle: Control::new(settings_label, UserIntent::ToggleSettings),
        settings: props.show_settings.then(|| settings_panel(props)),
        text_chat: props.text_chat_active.then(|| TextChatPanel {
            message: props.message.clone(),
            send: Control::new("Send", UserIntent::SendMessage),
            repeat: Control::new("Repeat", UserIntent::RepeatMessage),
        }),
    }
}

fn settings_panel(props: &ViewProps) -> SettingsPanel {
    let full = props.mode == SessionMode::Full;
    let yes_no = |flag: bool| (if flag { "Yes" } else { "No" }).to_string();

    let mut status = vec![
        StatusLine {
            label: "Session state",
            value: props.session_state.as_str().to_string(),
        },
        StatusLine {
            label: "Connection quality",
            value: props.connection_quality.as_str().to_string(),
        },
    ];
    if full {
        status.push(StatusLine {
            label: "User talking",
            value: yes_no(props.is_user_talking),
        });
    }
    status.push(StatusLine {
        label: "Avatar talking",
        value: yes_no(props.is_avatar_talking),
    });

    let mute_button = (full && props.is_active).then(|| {
        Control::new(
            if props.is_muted { "Unmute" } else { "Mute" },
            UserIntent::ToggleMute,
        )
    });

    let fields = vec![
        InputField {
            field: OverrideField::Avatar,
            value: props.custom_avatar_id.clone(),
        },
        InputField {
            field: OverrideField::Voice,
            value: props.custom_voice_id.clone(),
        },
        InputField {
            field: OverrideField::Context,
            value: props.custom_context_id.clone(),
        },
    ];

    let ready = props.is_stream_ready;
    let actions = vec![
        Control::new("Start Listening", UserIntent::StartListening).enabled_if(ready),
        Control::new("Stop Listening", UserIntent::StopListening).enabled_if(ready),
        Control::new("Interrupt", UserIntent::Interrupt).enabled_if(ready),
        Control::new("Keep Alive", UserIntent::KeepAlive),
    ];

    SettingsPanel {
        status,
        mute_button,
        fields,
        actions,
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.enabled {
            write!(f, "[{}]", self.label)
        } else {
            write!(f, "[{}] (disabled)", self.label)
        }
    }
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        if let Some(error) = &self.error_banner {
            writeln!(f, "{error}")?;
        }
        writeln!(f, "{}", self.voice_button)?;
        match self.video_overlay {
            Some(overlay) => writeln!(f, "<video> {overlay}")?,
            None => writeln!(f, "<video>")?,
        }
        writeln!(f, "{}", self.fullscreen_button)?;
        writeln!(f, "{}", self.settings_toggle)?;

        if let Some(settings) = &self.settings {
            for line in &settings.status {
                writeln!(f, "  {}: {}", line.label, line.value)?;
            }
            if let Some(mute) = &settings.mute_button {
                writeln!(f, "  {mute}")?;
            }
            for field in &settings.fields {
                if field.value.is_empty() {
                    writeln!(f, "  {}: ({})", field.field.label(), field.field.placeholder())?;
                } else {
                    writeln!(f, "  {}: {}", field.field.label(), field.value)?;
                }
            }
            let actions: Vec<String> = settings.actions.iter().map(Control::to_string).collect();
            writeln!(f, "  {}", actions.join(" "))?;
        }

        if let Some(chat) = &self.text_chat {
            writeln!(f, "-- Text Chat --")?;
            if chat.message.is_empty() {
                writeln!(f, "> (Type your message...)")?;
            } else {
                writeln!(f, "> {}", chat.message)?;
            }
            writeln!(f, "{} {}", chat.send, chat.repeat)?;
        }
        Ok(())
    }
}

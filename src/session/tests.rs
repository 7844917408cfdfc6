use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::{timeout, Duration};

use crate::config::CoordinatorConfig;
use crate::gateway::types::{OverrideParameters, SessionDescriptor};
use crate::session::coordinator::SessionCoordinator;
use crate::session::runtime::{spawn_session, SessionEvents, SessionHandle};
use crate::session::token::{TokenRequestError, TokenSource};
use crate::session::traits::{AvatarSdk, FullscreenSurface, MediaElement};
use crate::session::types::{
    ChatMode, CoordinatorEvent, LifecycleNotice, SdkUpdate, SessionCommand, SessionState,
    TokenPurpose, UserIntent,
};
use crate::view::ViewProps;

fn descriptor() -> SessionDescriptor {
    SessionDescriptor {
        session_token: "tok123".into(),
        session_id: "sess456".into(),
    }
}

fn coordinator() -> SessionCoordinator {
    SessionCoordinator::new(&CoordinatorConfig::default())
}

fn user(coordinator: &mut SessionCoordinator, intent: UserIntent) -> Vec<SessionCommand> {
    coordinator.handle(CoordinatorEvent::User(intent))
}

fn sdk(coordinator: &mut SessionCoordinator, update: SdkUpdate) -> Vec<SessionCommand> {
    coordinator.handle(CoordinatorEvent::Sdk(update))
}

fn issue(coordinator: &mut SessionCoordinator, purpose: TokenPurpose) -> Vec<SessionCommand> {
    coordinator.handle(CoordinatorEvent::TokenIssued {
        purpose,
        descriptor: descriptor(),
    })
}

fn start_session() -> SessionCommand {
    SessionCommand::StartSession {
        session_token: "tok123".into(),
    }
}

/// Drives a fresh coordinator to an active voice chat.
fn voice_chat_active() -> SessionCoordinator {
    let mut coordinator = coordinator();
    user(&mut coordinator, UserIntent::StartVoiceChat);
    issue(&mut coordinator, TokenPurpose::VoiceChat);
    sdk(&mut coordinator, SdkUpdate::SessionState(SessionState::Connected));
    sdk(&mut coordinator, SdkUpdate::StreamReady(true));
    sdk(&mut coordinator, SdkUpdate::VoiceChatActive(true));
    coordinator
}

#[test]
fn voice_start_stays_pending_until_stream_ready() {
    let mut coordinator = coordinator();

    let commands = user(&mut coordinator, UserIntent::StartVoiceChat);
    assert_eq!(
        commands,
        vec![SessionCommand::RequestToken {
            purpose: TokenPurpose::VoiceChat,
            overrides: OverrideParameters::default(),
        }]
    );
    assert!(coordinator.is_token_in_flight());

    assert_eq!(issue(&mut coordinator, TokenPurpose::VoiceChat), vec![start_session()]);
    assert!(coordinator.is_voice_pending());

    assert!(sdk(&mut coordinator, SdkUpdate::SessionState(SessionState::Connecting)).is_empty());
    assert!(sdk(&mut coordinator, SdkUpdate::SessionState(SessionState::Connected)).is_empty());
    assert!(coordinator.is_voice_pending());

    let commands = sdk(&mut coordinator, SdkUpdate::StreamReady(true));
    assert_eq!(
        commands,
        vec![
            SessionCommand::AttachMedia,
            SessionCommand::StartVoiceChat,
            SessionCommand::Notify(LifecycleNotice::VoiceChatStarted),
        ]
    );
    assert!(!coordinator.is_voice_pending());
    assert_eq!(coordinator.chat_mode(), ChatMode::Voice);
}

#[test]
fn voice_start_forwards_non_empty_overrides() {
    let mut coordinator = coordinator();
    user(&mut coordinator, UserIntent::SetCustomAvatarId("custom1".into()));
    user(&mut coordinator, UserIntent::SetCustomVoiceId(String::new()));
    user(&mut coordinator, UserIntent::SetCustomContextId("ctx-9".into()));

    let commands = user(&mut coordinator, UserIntent::StartVoiceChat);
    assert_eq!(
        commands,
        vec![SessionCommand::RequestToken {
            purpose: TokenPurpose::VoiceChat,
            overrides: OverrideParameters {
                avatar_id: Some("custom1".into()),
                voice_id: None,
                context_id: Some("ctx-9".into()),
            },
        }]
    );
}

#[test]
fn initial_avatar_id_prefills_override() {
    let config = CoordinatorConfig {
        initial_avatar_id: Some("preset".into()),
        ..CoordinatorConfig::default()
    };
    let coordinator = SessionCoordinator::new(&config);
    assert_eq!(coordinator.custom_avatar_id(), "preset");
}

#[test]
fn toggling_active_voice_chat_tears_down_session() {
    let mut coordinator = voice_chat_active();

    let commands = user(&mut coordinator, UserIntent::StartVoiceChat);
    assert_eq!(
        commands,
        vec![
            SessionCommand::StopVoiceChat,
            SessionCommand::StopSession,
            SessionCommand::Notify(LifecycleNotice::SessionStopped),
        ]
    );
    assert!(coordinator.session().is_none());
    assert_eq!(coordinator.chat_mode(), ChatMode::Idle);

    // Late reports from the stopped session do not notify twice.
    assert!(sdk(&mut coordinator, SdkUpdate::SessionState(SessionState::Disconnected)).is_empty());
}

#[test]
fn teardown_exits_fullscreen() {
    let mut coordinator = voice_chat_active();
    coordinator.handle(CoordinatorEvent::FullscreenChanged(true));

    let commands = user(&mut coordinator, UserIntent::StartVoiceChat);
    assert_eq!(commands.last(), Some(&SessionCommand::ExitFullscreen));
}

#[test]
fn disconnect_notifies_and_clears_session() {
    let mut coordinator = voice_chat_active();
    user(&mut coordinator, UserIntent::ToggleSettings);

    let commands = sdk(&mut coordinator, SdkUpdate::SessionState(SessionState::Disconnected));
    assert_eq!(
        commands,
        vec![SessionCommand::Notify(LifecycleNotice::SessionStopped)]
    );
    assert!(coordinator.session().is_none());
    assert!(!coordinator.is_settings_visible());
    assert_eq!(coordinator.observed().state, SessionState::Inactive);
}

#[test]
fn fullscreen_flag_mirrors_platform() {
    let mut coordinator = coordinator();

    assert_eq!(
        user(&mut coordinator, UserIntent::ToggleFullscreen),
        vec![SessionCommand::RequestFullscreen]
    );
    assert!(!coordinator.is_fullscreen());

    coordinator.handle(CoordinatorEvent::FullscreenChanged(true));
    assert!(coordinator.is_fullscreen());
    assert_eq!(
        user(&mut coordinator, UserIntent::ToggleFullscreen),
        vec![SessionCommand::ExitFullscreen]
    );

    // Escape key or other external exit.
    coordinator.handle(CoordinatorEvent::FullscreenChanged(false));
    assert!(!coordinator.is_fullscreen());
    assert_eq!(
        user(&mut coordinator, UserIntent::ToggleFullscreen),
        vec![SessionCommand::RequestFullscreen]
    );
}

#[test]
fn start_triggers_ignored_while_token_in_flight() {
    let mut coordinator = coordinator();
    user(&mut coordinator, UserIntent::StartVoiceChat);

    assert!(user(&mut coordinator, UserIntent::StartVoiceChat).is_empty());
    assert!(user(&mut coordinator, UserIntent::StartTextChat).is_empty());

    coordinator.handle(CoordinatorEvent::TokenFailed {
        purpose: TokenPurpose::VoiceChat,
        message: "avatar not found".into(),
    });
    assert!(!coordinator.is_token_in_flight());
    assert_eq!(coordinator.last_error(), Some("avatar not found"));
    assert!(coordinator.session().is_none());
    assert_eq!(coordinator.chat_mode(), ChatMode::Idle);

    let commands = user(&mut coordinator, UserIntent::StartVoiceChat);
    assert_eq!(commands.len(), 1);
    assert_eq!(coordinator.last_error(), None);
}

#[test]
fn text_chat_requests_token_without_overrides() {
    let mut coordinator = coordinator();
    user(&mut coordinator, UserIntent::SetCustomAvatarId("custom1".into()));

    assert_eq!(
        user(&mut coordinator, UserIntent::StartTextChat),
        vec![SessionCommand::RequestToken {
            purpose: TokenPurpose::TextChat,
            overrides: OverrideParameters::default(),
        }]
    );
    assert_eq!(issue(&mut coordinator, TokenPurpose::TextChat), vec![start_session()]);
    assert!(coordinator.is_text_chat_active());
}

#[test]
fn text_chat_stops_active_voice_chat() {
    let mut coordinator = voice_chat_active();

    let commands = user(&mut coordinator, UserIntent::StartTextChat);
    assert_eq!(commands, vec![SessionCommand::StopVoiceChat]);
    assert!(coordinator.is_text_chat_active());
    assert!(!coordinator.is_voice_pending());

    sdk(&mut coordinator, SdkUpdate::VoiceChatActive(false));
    assert_eq!(coordinator.chat_mode(), ChatMode::Text);
}

#[test]
fn voice_start_from_text_chat_waits_for_stream() {
    let mut coordinator = coordinator();
    user(&mut coordinator, UserIntent::StartTextChat);
    issue(&mut coordinator, TokenPurpose::TextChat);
    sdk(&mut coordinator, SdkUpdate::SessionState(SessionState::Connected));

    assert!(user(&mut coordinator, UserIntent::StartVoiceChat).is_empty());
    assert!(coordinator.is_voice_pending());
    assert!(!coordinator.is_text_chat_active());

    let commands = sdk(&mut coordinator, SdkUpdate::StreamReady(true));
    assert!(commands.contains(&SessionCommand::StartVoiceChat));
}

#[test]
fn voice_start_with_ready_stream_is_immediate() {
    let mut coordinator = coordinator();
    user(&mut coordinator, UserIntent::StartTextChat);
    issue(&mut coordinator, TokenPurpose::TextChat);
    sdk(&mut coordinator, SdkUpdate::SessionState(SessionState::Connected));
    sdk(&mut coordinator, SdkUpdate::StreamReady(true));

    assert_eq!(
        user(&mut coordinator, UserIntent::StartVoiceChat),
        vec![SessionCommand::StartVoiceChat]
    );
    assert_eq!(coordinator.chat_mode(), ChatMode::Voice);
}

#[test]
fn repeated_start_while_connecting_does_not_restart_session() {
    let mut coordinator = coordinator();
    user(&mut coordinator, UserIntent::StartVoiceChat);
    issue(&mut coordinator, TokenPurpose::VoiceChat);

    assert!(user(&mut coordinator, UserIntent::StartVoiceChat).is_empty());
    assert!(coordinator.is_voice_pending());
}

#[test]
fn media_attached_once_per_ready_transition() {
    let mut coordinator = voice_chat_active();
    let attaches = |commands: Vec<SessionCommand>| {
        commands
            .iter()
            .filter(|command| **command == SessionCommand::AttachMedia)
            .count()
    };

    assert_eq!(attaches(sdk(&mut coordinator, SdkUpdate::StreamReady(true))), 0);
    assert_eq!(attaches(sdk(&mut coordinator, SdkUpdate::StreamReady(false))), 0);
    assert_eq!(attaches(sdk(&mut coordinator, SdkUpdate::StreamReady(true))), 1);
}

#[test]
fn mute_toggle_follows_observed_flag() {
    let mut coordinator = coordinator();
    assert!(user(&mut coordinator, UserIntent::ToggleMute).is_empty());

    let mut coordinator = voice_chat_active();
    assert_eq!(
        user(&mut coordinator, UserIntent::ToggleMute),
        vec![SessionCommand::Mute]
    );
    sdk(&mut coordinator, SdkUpdate::Muted(true));
    assert_eq!(
        user(&mut coordinator, UserIntent::ToggleMute),
        vec![SessionCommand::Unmute]
    );
}

#[test]
fn message_dispatch_requires_draft_and_session() {
    let mut coordinator = coordinator();
    user(&mut coordinator, UserIntent::SetMessage("hello".into()));
    assert!(user(&mut coordinator, UserIntent::SendMessage).is_empty());
    assert_eq!(coordinator.message(), "hello");

    let mut coordinator = voice_chat_active();
    user(&mut coordinator, UserIntent::SetMessage("   ".into()));
    assert!(user(&mut coordinator, UserIntent::SendMessage).is_empty());

    user(&mut coordinator, UserIntent::SetMessage("hello".into()));
    assert_eq!(
        user(&mut coordinator, UserIntent::SendMessage),
        vec![SessionCommand::SendMessage("hello".into())]
    );
    assert_eq!(coordinator.message(), "");

    user(&mut coordinator, UserIntent::SetMessage("again".into()));
    assert_eq!(
        user(&mut coordinator, UserIntent::RepeatMessage),
        vec![SessionCommand::Repeat("again".into())]
    );
}

#[test]
fn session_controls_delegate_only_with_session() {
    let mut coordinator = coordinator();
    for intent in [
        UserIntent::StartListening,
        UserIntent::StopListening,
        UserIntent::Interrupt,
        UserIntent::KeepAlive,
    ] {
        assert!(user(&mut coordinator, intent).is_empty());
    }

    let mut coordinator = voice_chat_active();
    assert_eq!(
        user(&mut coordinator, UserIntent::Interrupt),
        vec![SessionCommand::Interrupt]
    );
    assert_eq!(
        user(&mut coordinator, UserIntent::KeepAlive),
        vec![SessionCommand::KeepAlive]
    );
}

#[test]
fn state_reports_before_start_are_ignored() {
    let mut coordinator = coordinator();
    assert!(sdk(&mut coordinator, SdkUpdate::SessionState(SessionState::Disconnected)).is_empty());
    assert_eq!(coordinator.observed().state, SessionState::Inactive);
}

// Runtime

#[derive(Clone, Default)]
struct RecordingSdk {
    calls: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<Vec<&'static str>>>,
    /// When set, `start_session` reports `Connecting` before it returns.
    reporter: Arc<Mutex<Option<SessionEvents>>>,
}

impl RecordingSdk {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    fn fail_on(&self, call: &'static str) {
        self.failing.lock().expect("failing lock poisoned").push(call);
    }

    fn record(&self, call: &'static str, detail: Option<&str>) -> anyhow::Result<()> {
        let entry = match detail {
            Some(detail) => format!("{call}:{detail}"),
            None => call.to_string(),
        };
        self.calls.lock().expect("calls lock poisoned").push(entry);

        if self.failing.lock().expect("failing lock poisoned").contains(&call) {
            return Err(anyhow!("{call} rejected"));
        }
        Ok(())
    }
}

#[async_trait]
impl AvatarSdk for RecordingSdk {
    async fn start_session(&self, session_token: &str) -> anyhow::Result<()> {
        let reporter = self.reporter.lock().expect("reporter lock poisoned").clone();
        if let Some(events) = reporter {
            events.observe(SdkUpdate::SessionState(SessionState::Connecting))?;
        }
        self.record("start_session", Some(session_token))
    }

    async fn stop_session(&self) -> anyhow::Result<()> {
        self.record("stop_session", None)
    }

    async fn attach_element(&self, element: &MediaElement) -> anyhow::Result<()> {
        self.record("attach_element", Some(element.id.as_str()))
    }

    async fn start_voice_chat(&self) -> anyhow::Result<()> {
        self.record("start_voice_chat", None)
    }

    async fn stop_voice_chat(&self) -> anyhow::Result<()> {
        self.record("stop_voice_chat", None)
    }

    async fn mute(&self) -> anyhow::Result<()> {
        self.record("mute", None)
    }

    async fn unmute(&self) -> anyhow::Result<()> {
        self.record("unmute", None)
    }

    async fn send_message(&self, message: &str) -> anyhow::Result<()> {
        self.record("send_message", Some(message))
    }

    async fn repeat(&self, message: &str) -> anyhow::Result<()> {
        self.record("repeat", Some(message))
    }

    async fn start_listening(&self) -> anyhow::Result<()> {
        self.record("start_listening", None)
    }

    async fn stop_listening(&self) -> anyhow::Result<()> {
        self.record("stop_listening", None)
    }

    async fn interrupt(&self) -> anyhow::Result<()> {
        self.record("interrupt", None)
    }

    async fn keep_alive(&self) -> anyhow::Result<()> {
        self.record("keep_alive", None)
    }
}

#[derive(Clone, Default)]
struct RecordingSurface {
    calls: Arc<Mutex<Vec<&'static str>>>,
    /// When set, `request_fullscreen` reports the change before it returns.
    reporter: Arc<Mutex<Option<SessionEvents>>>,
}

#[async_trait]
impl FullscreenSurface for RecordingSurface {
    async fn request_fullscreen(&self) -> anyhow::Result<()> {
        self.calls.lock().expect("surface lock poisoned").push("request");
        let reporter = self.reporter.lock().expect("reporter lock poisoned").clone();
        if let Some(events) = reporter {
            events.fullscreen_changed(true)?;
        }
        Ok(())
    }

    async fn exit_fullscreen(&self) -> anyhow::Result<()> {
        self.calls.lock().expect("surface lock poisoned").push("exit");
        Ok(())
    }
}

/// Token source answering from a queue, optionally held until released.
struct QueuedTokens {
    responses: Mutex<VecDeque<Result<SessionDescriptor, TokenRequestError>>>,
    requests: AtomicUsize,
    gate: Option<Semaphore>,
}

impl QueuedTokens {
    fn new(responses: Vec<Result<SessionDescriptor, TokenRequestError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: AtomicUsize::new(0),
            gate: None,
        }
    }

    fn gated(responses: Vec<Result<SessionDescriptor, TokenRequestError>>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(responses)
        }
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for QueuedTokens {
    async fn request_token(
        &self,
        _overrides: OverrideParameters,
    ) -> Result<SessionDescriptor, TokenRequestError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.responses
            .lock()
            .expect("responses lock poisoned")
            .pop_front()
            .unwrap_or(Err(TokenRequestError::EmptyToken))
    }
}

fn spawn(
    sdk: &RecordingSdk,
    surface: &RecordingSurface,
    tokens: Arc<QueuedTokens>,
) -> SessionHandle {
    spawn_session(
        CoordinatorConfig::default(),
        Arc::new(sdk.clone()),
        Arc::new(surface.clone()),
        tokens,
        MediaElement::default(),
    )
}

async fn wait_for_props(handle: &SessionHandle, predicate: impl FnMut(&ViewProps) -> bool) {
    let mut props = handle.watch_props();
    timeout(Duration::from_secs(1), props.wait_for(predicate))
        .await
        .expect("props update timed out")
        .map(|_| ())
        .expect("props channel closed");
}

#[tokio::test]
async fn runtime_drives_voice_chat_lifecycle() {
    let sdk = RecordingSdk::default();
    let surface = RecordingSurface::default();
    let tokens = Arc::new(QueuedTokens::new(vec![Ok(descriptor())]));
    let handle = spawn(&sdk, &surface, Arc::clone(&tokens));
    let mut lifecycle = handle.subscribe_lifecycle();

    handle
        .dispatch(UserIntent::StartVoiceChat)
        .await
        .expect("dispatch start");
    wait_for_props(&handle, |props| props.has_session_token).await;
    assert_eq!(sdk.calls(), vec!["start_session:tok123".to_string()]);

    handle
        .observe(SdkUpdate::SessionState(SessionState::Connected))
        .expect("observe connected");
    handle
        .observe(SdkUpdate::StreamReady(true))
        .expect("observe stream ready");
    wait_for_props(&handle, |props| props.is_stream_ready).await;
    assert_eq!(
        sdk.calls()[1..],
        ["attach_element:avatar-video", "start_voice_chat"]
    );

    let notice = timeout(Duration::from_secs(1), lifecycle.recv())
        .await
        .expect("lifecycle timed out")
        .expect("lifecycle closed");
    assert_eq!(notice, LifecycleNotice::VoiceChatStarted);

    handle
        .observe(SdkUpdate::VoiceChatActive(true))
        .expect("observe voice active");
    wait_for_props(&handle, |props| props.is_active).await;
    assert_eq!(handle.render().voice_button.label, "Stop Voice Chat");

    handle
        .dispatch(UserIntent::StartVoiceChat)
        .await
        .expect("dispatch stop");
    assert_eq!(sdk.calls()[3..], ["stop_voice_chat", "stop_session"]);
    let notice = timeout(Duration::from_secs(1), lifecycle.recv())
        .await
        .expect("lifecycle timed out")
        .expect("lifecycle closed");
    assert_eq!(notice, LifecycleNotice::SessionStopped);

    let props = handle.view_props();
    assert!(!props.has_session_token);
    assert!(!props.is_active);
    assert_eq!(tokens.requests(), 1);
}

#[tokio::test]
async fn runtime_surfaces_token_failure() {
    let sdk = RecordingSdk::default();
    let surface = RecordingSurface::default();
    let tokens = Arc::new(QueuedTokens::new(vec![Err(TokenRequestError::Rejected {
        status: 404,
        message: "avatar not found".into(),
    })]));
    let handle = spawn(&sdk, &surface, tokens);

    handle
        .dispatch(UserIntent::StartVoiceChat)
        .await
        .expect("dispatch start");
    wait_for_props(&handle, |props| props.error.is_some()).await;

    assert!(sdk.calls().is_empty());
    assert_eq!(
        handle.render().error_banner.as_deref(),
        Some("Error getting session token: avatar not found")
    );
}

#[tokio::test]
async fn runtime_ignores_starts_while_token_pending() {
    let sdk = RecordingSdk::default();
    let surface = RecordingSurface::default();
    let tokens = Arc::new(QueuedTokens::gated(vec![Ok(descriptor())]));
    let handle = spawn(&sdk, &surface, Arc::clone(&tokens));

    handle
        .dispatch(UserIntent::StartVoiceChat)
        .await
        .expect("dispatch first start");
    handle
        .dispatch(UserIntent::StartVoiceChat)
        .await
        .expect("dispatch second start");
    handle
        .dispatch(UserIntent::StartTextChat)
        .await
        .expect("dispatch text start");

    tokens.release();
    wait_for_props(&handle, |props| props.has_session_token).await;

    assert_eq!(tokens.requests(), 1);
    assert_eq!(sdk.calls(), vec!["start_session:tok123".to_string()]);
}

#[tokio::test]
async fn runtime_mirrors_fullscreen_notifications() {
    let sdk = RecordingSdk::default();
    let surface = RecordingSurface::default();
    let handle = spawn(&sdk, &surface, Arc::new(QueuedTokens::new(Vec::new())));

    handle
        .dispatch(UserIntent::ToggleFullscreen)
        .await
        .expect("dispatch fullscreen");
    assert!(!handle.view_props().is_fullscreen);

    handle.fullscreen_changed(true).expect("entered");
    wait_for_props(&handle, |props| props.is_fullscreen).await;
    assert_eq!(handle.render().fullscreen_button.label, "Exit Fullscreen");

    handle.fullscreen_changed(false).expect("exited");
    wait_for_props(&handle, |props| !props.is_fullscreen).await;
    assert_eq!(
        *surface.calls.lock().expect("surface lock poisoned"),
        vec!["request"]
    );
}

#[tokio::test]
async fn runtime_keeps_running_after_sdk_failure() {
    let sdk = RecordingSdk::default();
    sdk.fail_on("start_session");
    let surface = RecordingSurface::default();
    let tokens = Arc::new(QueuedTokens::new(vec![Ok(descriptor())]));
    let handle = spawn(&sdk, &surface, tokens);
    let events = handle.events();

    events
        .dispatch(UserIntent::StartTextChat)
        .await
        .expect("dispatch text start");
    wait_for_props(&handle, |props| props.text_chat_active).await;

    events
        .dispatch(UserIntent::SetMessage("hello".into()))
        .await
        .expect("set message");
    events
        .dispatch(UserIntent::SendMessage)
        .await
        .expect("send message");

    assert_eq!(
        sdk.calls(),
        vec![
            "start_session:tok123".to_string(),
            "send_message:hello".to_string()
        ]
    );
    assert_eq!(handle.view_props().message, "");
}

#[tokio::test]
async fn dropped_handle_closes_event_sender() {
    let sdk = RecordingSdk::default();
    let surface = RecordingSurface::default();
    let handle = spawn(&sdk, &surface, Arc::new(QueuedTokens::new(Vec::new())));
    let events = handle.events();
    drop(handle);
    tokio::task::yield_now().await;

    assert!(events.dispatch(UserIntent::KeepAlive).await.is_err());
}

#[tokio::test]
async fn surface_can_report_from_inside_its_command() {
    let sdk = RecordingSdk::default();
    let surface = RecordingSurface::default();
    let handle = spawn(&sdk, &surface, Arc::new(QueuedTokens::new(Vec::new())));
    *surface.reporter.lock().expect("reporter lock poisoned") = Some(handle.events());

    timeout(
        Duration::from_secs(1),
        handle.dispatch(UserIntent::ToggleFullscreen),
    )
    .await
    .expect("toggle fullscreen stalled")
    .expect("dispatch fullscreen");
    wait_for_props(&handle, |props| props.is_fullscreen).await;

    timeout(Duration::from_secs(1), handle.dispatch(UserIntent::ToggleFullscreen))
        .await
        .expect("second toggle stalled")
        .expect("dispatch exit");
    assert_eq!(
        *surface.calls.lock().expect("surface lock poisoned"),
        vec!["request", "exit"]
    );
}

#[tokio::test]
async fn sdk_can_report_from_inside_start_session() {
    let sdk = RecordingSdk::default();
    let surface = RecordingSurface::default();
    let tokens = Arc::new(QueuedTokens::new(vec![Ok(descriptor())]));
    let handle = spawn(&sdk, &surface, tokens);
    *sdk.reporter.lock().expect("reporter lock poisoned") = Some(handle.events());

    handle
        .dispatch(UserIntent::StartVoiceChat)
        .await
        .expect("dispatch start");
    wait_for_props(&handle, |props| props.session_state == SessionState::Connecting).await;

    timeout(Duration::from_secs(1), handle.dispatch(UserIntent::KeepAlive))
        .await
        .expect("keep alive stalled")
        .expect("dispatch keep alive");
    assert_eq!(
        sdk.calls(),
        vec!["start_session:tok123".to_string(), "keep_alive".to_string()]
    );
}

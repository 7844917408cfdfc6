use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, warn};

use crate::gateway::types::OverrideParameters;
use crate::session::coordinator::SessionCoordinator;
use crate::session::token::TokenSource;
use crate::session::traits::{AvatarSdk, FullscreenSurface, MediaElement};
use crate::session::types::{CoordinatorEvent, LifecycleNotice, SessionCommand, TokenPurpose};
use crate::telemetry::events::{record_session_command, record_token_request};
use crate::view::ViewProps;

use super::Envelope;

pub(super) struct SessionWorker {
    pub(super) coordinator: SessionCoordinator,
    pub(super) events_rx: mpsc::Receiver<Envelope>,
    pub(super) reports_rx: mpsc::UnboundedReceiver<CoordinatorEvent>,
    pub(super) events_tx: mpsc::WeakSender<Envelope>,
    pub(super) sdk: Arc<dyn AvatarSdk>,
    pub(super) surface: Arc<dyn FullscreenSurface>,
    pub(super) tokens: Arc<dyn TokenSource>,
    pub(super) video: MediaElement,
    pub(super) lifecycle_tx: broadcast::Sender<LifecycleNotice>,
    pub(super) props_tx: watch::Sender<ViewProps>,
}

impl SessionWorker {
    pub(super) async fn run(mut self) {
        loop {
            let (event, ack) = tokio::select! {
                biased;
                Some(event) = self.reports_rx.recv() => (event, None),
                Some(Envelope { event, ack }) = self.events_rx.recv() => (event, ack),
                else => break,
            };

            let commands = self.coordinator.handle(event);
            for command in commands {
                self.execute(command).await;
            }

            self.props_tx
                .send_replace(ViewProps::from_coordinator(&self.coordinator));

            if let Some(ack) = ack {
                let _ = ack.send(());
            }
        }
        debug!(target: "session_runtime", "session event channel closed");
    }

    async fn execute(&self, command: SessionCommand) {
        let name = command.as_str();
        let started = Instant::now();

        let result = match command {
            SessionCommand::RequestToken { purpose, overrides } => {
                self.request_token(purpose, overrides);
                return;
            }
            SessionCommand::Notify(notice) => {
                self.notify(notice);
                return;
            }
            SessionCommand::StartSession { session_token } => {
                self.sdk.start_session(&session_token).await
            }
            SessionCommand::StopSession => self.sdk.stop_session().await,
            SessionCommand::AttachMedia => self.sdk.attach_element(&self.video).await,
            SessionCommand::StartVoiceChat => self.sdk.start_voice_chat().await,
            SessionCommand::StopVoiceChat => self.sdk.stop_voice_chat().await,
            SessionCommand::Mute => self.sdk.mute().await,
            SessionCommand::Unmute => self.sdk.unmute().await,
            SessionCommand::SendMessage(message) => self.sdk.send_message(&message).await,
            SessionCommand::Repeat(message) => self.sdk.repeat(&message).await,
            SessionCommand::StartListening => self.sdk.start_listening().await,
            SessionCommand::StopListening => self.sdk.stop_listening().await,
            SessionCommand::Interrupt => self.sdk.interrupt().await,
            SessionCommand::KeepAlive => self.sdk.keep_alive().await,
            SessionCommand::RequestFullscreen => self.surface.request_fullscreen().await,
            SessionCommand::ExitFullscreen => self.surface.exit_fullscreen().await,
        };

        if let Err(err) = &result {
            warn!(
                target: "session_runtime",
                command = name,
                error = %err,
                "session command failed"
            );
        }
        record_session_command(name, result.is_ok(), started.elapsed());
    }

    /// Runs the request off the worker so later events are still reduced
    /// while it is outstanding.
    fn request_token(&self, purpose: TokenPurpose, overrides: OverrideParameters) {
        let Some(events_tx) = self.events_tx.upgrade() else {
            warn!(
                target: "session_runtime",
                "session closed before the token request could start"
            );
            return;
        };
        let tokens = Arc::clone(&self.tokens);

        tokio::spawn(async move {
            let started = Instant::now();
            let result = tokens.request_token(overrides).await;
            record_token_request(purpose.as_str(), result.is_ok(), started.elapsed());

            let event = match result {
                Ok(descriptor) => CoordinatorEvent::TokenIssued {
                    purpose,
                    descriptor,
                },
                Err(err) => CoordinatorEvent::TokenFailed {
                    purpose,
                    message: err.to_string(),
                },
            };

            if events_tx.send(Envelope { event, ack: None }).await.is_err() {
                debug!(
                    target: "session_runtime",
                    purpose = purpose.as_str(),
                    "dropping token result for a closed session"
                );
            }
        });
    }

    fn notify(&self, notice: LifecycleNotice) {
        if let Err(err) = self.lifecycle_tx.send(notice) {
            debug!(
                target: "session_runtime",
                %err,
                "no lifecycle subscribers"
            );
        }
    }
}

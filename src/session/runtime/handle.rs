use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::session::types::{CoordinatorEvent, LifecycleNotice, SdkUpdate, UserIntent};
use crate::view::{render, SessionView, ViewProps};

use super::Envelope;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("session worker is no longer running")]
pub struct SessionClosed;

/// Cloneable input side of a running session.
///
/// [`dispatch`](Self::dispatch) resolves once the worker has reduced the
/// intent and executed the commands it produced. Token requests are the
/// exception: they complete later and land as their own event.
///
/// [`observe`](Self::observe) and [`fullscreen_changed`](Self::fullscreen_changed)
/// only enqueue. Adapters call them from inside their own commands, which the
/// worker is still awaiting.
#[derive(Clone)]
pub struct SessionEvents {
    tx: mpsc::Sender<Envelope>,
    reports_tx: mpsc::UnboundedSender<CoordinatorEvent>,
}

impl SessionEvents {
    pub async fn dispatch(&self, intent: UserIntent) -> Result<(), SessionClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let envelope = Envelope {
            event: CoordinatorEvent::User(intent),
            ack: Some(ack_tx),
        };

        if let Err(err) = self.tx.send(envelope).await {
            warn!(
                target: "session_runtime",
                %err,
                "failed to enqueue user intent"
            );
            return Err(SessionClosed);
        }

        ack_rx.await.map_err(|_| SessionClosed)
    }

    pub fn observe(&self, update: SdkUpdate) -> Result<(), SessionClosed> {
        self.report(CoordinatorEvent::Sdk(update))
    }

    pub fn fullscreen_changed(&self, is_fullscreen: bool) -> Result<(), SessionClosed> {
        self.report(CoordinatorEvent::FullscreenChanged(is_fullscreen))
    }

    fn report(&self, event: CoordinatorEvent) -> Result<(), SessionClosed> {
        self.reports_tx.send(event).map_err(|err| {
            warn!(
                target: "session_runtime",
                %err,
                "failed to enqueue session report"
            );
            SessionClosed
        })
    }
}

pub struct SessionHandle {
    events: SessionEvents,
    lifecycle_tx: broadcast::Sender<LifecycleNotice>,
    props_rx: watch::Receiver<ViewProps>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub(super) fn new(
        events_tx: mpsc::Sender<Envelope>,
        reports_tx: mpsc::UnboundedSender<CoordinatorEvent>,
        lifecycle_tx: broadcast::Sender<LifecycleNotice>,
        props_rx: watch::Receiver<ViewProps>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            events: SessionEvents {
                tx: events_tx,
                reports_tx,
            },
            lifecycle_tx,
            props_rx,
            worker: Some(worker),
        }
    }

    pub fn events(&self) -> SessionEvents {
        self.events.clone()
    }

    pub async fn dispatch(&self, intent: UserIntent) -> Result<(), SessionClosed> {
        self.events.dispatch(intent).await
    }

    pub fn observe(&self, update: SdkUpdate) -> Result<(), SessionClosed> {
        self.events.observe(update)
    }

    pub fn fullscreen_changed(&self, is_fullscreen: bool) -> Result<(), SessionClosed> {
        self.events.fullscreen_changed(is_fullscreen)
    }

    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<LifecycleNotice> {
        self.lifecycle_tx.subscribe()
    }

    /// Snapshot of the props published after the last processed event.
    pub fn view_props(&self) -> ViewProps {
        self.props_rx.borrow().clone()
    }

    pub fn watch_props(&self) -> watch::Receiver<ViewProps> {
        self.props_rx.clone()
    }

    pub fn render(&self) -> SessionView {
        render(&self.props_rx.borrow())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

mod handle;
mod worker;

pub use handle::{SessionClosed, SessionEvents, SessionHandle};

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::config::CoordinatorConfig;
use crate::session::coordinator::SessionCoordinator;
use crate::session::token::TokenSource;
use crate::session::traits::{AvatarSdk, FullscreenSurface, MediaElement};
use crate::session::types::CoordinatorEvent;
use crate::view::ViewProps;

use self::worker::SessionWorker;

const LIFECYCLE_CAPACITY: usize = 16;

/// Event plus an optional acknowledgement fired once the worker has reduced it
/// and executed the resulting commands.
pub(crate) struct Envelope {
    pub(crate) event: CoordinatorEvent,
    pub(crate) ack: Option<tokio::sync::oneshot::Sender<()>>,
}

/// Starts the worker that owns a [`SessionCoordinator`] and returns the handle
/// used to feed it.
///
/// Events are processed strictly one at a time. User intents travel on a
/// bounded, acknowledged queue. SDK and platform reports travel on an
/// unbounded queue without acknowledgement, so an adapter may report from
/// inside one of its own commands. Pending reports are reduced before the
/// next intent. Token requests run beside the worker and report back through
/// the intent queue.
pub fn spawn_session(
    config: CoordinatorConfig,
    sdk: Arc<dyn AvatarSdk>,
    surface: Arc<dyn FullscreenSurface>,
    tokens: Arc<dyn TokenSource>,
    video: MediaElement,
) -> SessionHandle {
    let coordinator = SessionCoordinator::new(&config);
    let (events_tx, events_rx) = mpsc::channel(config.event_capacity.max(1));
    let (reports_tx, reports_rx) = mpsc::unbounded_channel();
    let (lifecycle_tx, _) = broadcast::channel(LIFECYCLE_CAPACITY);
    let (props_tx, props_rx) = watch::channel(ViewProps::from_coordinator(&coordinator));

    let worker = SessionWorker {
        coordinator,
        events_rx,
        reports_rx,
        events_tx: events_tx.downgrade(),
        sdk,
        surface,
        tokens,
        video,
        lifecycle_tx: lifecycle_tx.clone(),
        props_tx,
    };
    let join = tokio::spawn(worker.run());

    SessionHandle::new(events_tx, reports_tx, lifecycle_tx, props_rx, join)
}

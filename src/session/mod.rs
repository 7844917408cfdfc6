//! Avatar session coordination.
//!
//! [`coordinator`] is the pure reducer; [`runtime`] owns one coordinator and
//! executes the commands it emits against the avatar SDK.

pub mod coordinator;
pub mod runtime;
pub mod token;
pub mod traits;
pub mod types;

pub use coordinator::SessionCoordinator;
pub use runtime::{spawn_session, SessionClosed, SessionEvents, SessionHandle};
pub use token::{GatewayClient, TokenRequestError, TokenSource};
pub use traits::{AvatarSdk, FullscreenSurface, MediaElement};
pub use types::{
    ChatMode, ConnectionQuality, CoordinatorEvent, LifecycleNotice, ObservedSession, SdkUpdate,
    SessionCommand, SessionState, TokenPurpose, UserIntent,
};

#[cfg(test)]
mod tests;

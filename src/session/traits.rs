use anyhow::Result;
use async_trait::async_trait;

/// Rendering element the avatar stream is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaElement {
    pub id: String,
}

impl MediaElement {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into() }
    }
}

impl Default for MediaElement {
    fn default() -> Self {
        Self::new("avatar-video")
    }
}

/// Operations of the external avatar SDK. State changes come back as
/// [`SdkUpdate`](crate::session::SdkUpdate) values, not return values.
#[async_trait]
pub trait AvatarSdk: Send + Sync {
    async fn start_session(&self, session_token: &str) -> Result<()>;
    async fn stop_session(&self) -> Result<()>;
    async fn attach_element(&self, element: &MediaElement) -> Result<()>;

    async fn start_voice_chat(&self) -> Result<()>;
    async fn stop_voice_chat(&self) -> Result<()>;
    async fn mute(&self) -> Result<()>;
    async fn unmute(&self) -> Result<()>;

    async fn send_message(&self, message: &str) -> Result<()>;
    async fn repeat(&self, message: &str) -> Result<()>;
    async fn start_listening(&self) -> Result<()>;
    async fn stop_listening(&self) -> Result<()>;
    async fn interrupt(&self) -> Result<()>;
    async fn keep_alive(&self) -> Result<()>;
}

/// Platform fullscreen control for the video container.
#[async_trait]
pub trait FullscreenSurface: Send + Sync {
    async fn request_fullscreen(&self) -> Result<()>;
    async fn exit_fullscreen(&self) -> Result<()>;
}

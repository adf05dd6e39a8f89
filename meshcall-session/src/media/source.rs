use crate::error::LocalMediaError;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One outgoing media track, shared by reference across every peer link so
/// an in-place enable/disable or sender swap reaches the whole mesh at once.
///
/// `as_any` lets a concrete transport recover its own track type when the
/// session hands the track back for attachment.
pub trait OutgoingTrack: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> TrackKind;
    fn set_enabled(&self, enabled: bool);
    fn enabled(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

/// The camera/microphone tracks currently captured, either of which may be
/// absent (audio-only call, or degraded receive-only mode).
#[derive(Clone, Default)]
pub struct LocalTracks {
    pub audio: Option<Arc<dyn OutgoingTrack>>,
    pub video: Option<Arc<dyn OutgoingTrack>>,
}

impl LocalTracks {
    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// A live screen capture. `ended` fires when the capture stops outside the
/// session (the platform's own stop-sharing control); the session treats it
/// like an explicit stop. A dropped sender means the capture was released
/// normally and fires nothing.
pub struct ScreenCapture {
    pub track: Arc<dyn OutgoingTrack>,
    pub ended: oneshot::Receiver<()>,
}

/// External capture collaborator. Permission or device failures surface as
/// `LocalMediaError`; the session stays usable without outgoing tracks.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalTracks, LocalMediaError>;

    /// Capture a screen/display video track.
    async fn acquire_screen(&self) -> Result<ScreenCapture, LocalMediaError>;

    async fn release(&self, tracks: LocalTracks);

    async fn release_track(&self, track: Arc<dyn OutgoingTrack>);
}

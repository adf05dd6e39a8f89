use crate::media::source::{LocalTracks, OutgoingTrack};
use std::sync::Arc;

/// Which source currently feeds the outgoing video sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFeed {
    Camera,
    Screen,
}

/// Room-wide outgoing media state. Mutated only on the session event loop;
/// peer links read it when (re)binding tracks.
///
/// The camera track is kept untouched while a screen share is active, so
/// stopping the share restores the identical track reference rather than a
/// re-captured lookalike.
pub struct LocalMediaState {
    camera: LocalTracks,
    screen: Option<Arc<dyn OutgoingTrack>>,
    feed: VideoFeed,
    audio_enabled: bool,
    video_enabled: bool,
}

impl LocalMediaState {
    pub fn new(camera: LocalTracks) -> Self {
        Self {
            camera,
            screen: None,
            feed: VideoFeed::Camera,
            audio_enabled: true,
            video_enabled: true,
        }
    }

    pub fn feed(&self) -> VideoFeed {
        self.feed
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.feed == VideoFeed::Screen
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Tracks to attach when a new peer link is created: audio plus the
    /// currently active video source.
    pub fn outgoing_tracks(&self) -> Vec<Arc<dyn OutgoingTrack>> {
        let mut tracks = Vec::new();
        if let Some(audio) = &self.camera.audio {
            tracks.push(audio.clone());
        }
        if let Some(video) = self.current_video() {
            tracks.push(video);
        }
        tracks
    }

    /// The video track currently feeding every sender.
    pub fn current_video(&self) -> Option<Arc<dyn OutgoingTrack>> {
        match self.feed {
            VideoFeed::Screen => self.screen.clone(),
            VideoFeed::Camera => self.camera.video.clone(),
        }
    }

    /// The camera video track, regardless of the active feed.
    pub fn camera_video(&self) -> Option<Arc<dyn OutgoingTrack>> {
        self.camera.video.clone()
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
        if let Some(audio) = &self.camera.audio {
            audio.set_enabled(enabled);
        }
    }

    pub fn set_video_enabled(&mut self, enabled: bool) {
        self.video_enabled = enabled;
        if let Some(video) = &self.camera.video {
            video.set_enabled(enabled);
        }
    }

    /// Switch the active feed to a freshly captured screen track.
    pub fn begin_screen_share(&mut self, track: Arc<dyn OutgoingTrack>) {
        self.screen = Some(track);
        self.feed = VideoFeed::Screen;
    }

    /// Switch back to the camera. Returns the screen track for release.
    pub fn end_screen_share(&mut self) -> Option<Arc<dyn OutgoingTrack>> {
        self.feed = VideoFeed::Camera;
        self.screen.take()
    }

    /// Give up every held track for release on leave.
    pub fn take_all(&mut self) -> (LocalTracks, Option<Arc<dyn OutgoingTrack>>) {
        self.feed = VideoFeed::Camera;
        (
            std::mem::take(&mut self.camera),
            self.screen.take(),
        )
    }
}

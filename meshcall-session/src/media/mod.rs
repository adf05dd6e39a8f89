mod local;
mod source;

pub use local::{LocalMediaState, VideoFeed};
pub use source::{
    LocalTracks, MediaConstraints, MediaSource, OutgoingTrack, ScreenCapture, TrackKind,
};

use crate::media::TrackKind;
use meshcall_core::{IceCandidateInit, ParticipantId};

/// Connection-primitive connectivity, reduced to what the session cares
/// about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectivityState {
    pub fn is_lost(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }
}

/// Handle for an incoming remote track, surfaced to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// Events a peer transport pushes back into the session loop. Completions
/// and callbacks re-enter the single-writer queue through this channel.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A locally gathered candidate to trickle out (`None` =
    /// end-of-candidates).
    CandidateGenerated(ParticipantId, Option<IceCandidateInit>),
    ConnectivityChanged(ParticipantId, ConnectivityState),
    TrackReceived(ParticipantId, RemoteTrack),
    /// The connectivity-loss grace timer fired for this loss epoch.
    GraceElapsed {
        peer: ParticipantId,
        epoch: u32,
    },
    /// The local screen capture stopped outside the session (platform
    /// stop-sharing control) while this track was the active feed.
    ScreenShareEnded {
        track_id: String,
    },
}
